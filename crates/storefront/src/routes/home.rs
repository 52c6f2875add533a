//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::models::views::MenuItemView;
use crate::state::AppState;

/// A customer review shown on the home page.
#[derive(Clone)]
pub struct Testimonial {
    pub name: &'static str,
    pub role: &'static str,
    pub comment: &'static str,
    /// Out of 5.
    pub rating: u8,
}

/// Customer reviews.
pub const TESTIMONIALS: [Testimonial; 3] = [
    Testimonial {
        name: "Sophie Martin",
        role: "Cliente fidèle",
        comment: "Le meilleur poulet braisé de Calais ! Les saveurs me rappellent mon voyage en Côte d'Ivoire.",
        rating: 5,
    },
    Testimonial {
        name: "Jean Kouassi",
        role: "Amateur de cuisine africaine",
        comment: "Enfin un restaurant qui respecte les vraies recettes. Le yassa est exceptionnel.",
        rating: 5,
    },
    Testimonial {
        name: "Marie Dosso",
        role: "Cliente",
        comment: "Accueil chaleureux et plats généreux. L'alloco est parfait, on se sent comme à la maison.",
        rating: 5,
    },
];

impl Testimonial {
    /// Rating as filled stars.
    #[must_use]
    pub fn stars(&self) -> String {
        "★".repeat(usize::from(self.rating))
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub signature_dishes: Vec<MenuItemView>,
    pub testimonials: Vec<Testimonial>,
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    HomeTemplate {
        signature_dishes: state.menu().featured().map(MenuItemView::from).collect(),
        testimonials: TESTIMONIALS.to_vec(),
    }
}
