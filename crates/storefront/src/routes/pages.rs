//! Static content page route handlers: about and menu.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use mama_foods_core::MenuCategory;
use tracing::instrument;

use crate::filters;
use crate::models::views::MenuItemView;
use crate::state::AppState;

/// A member of the kitchen team.
#[derive(Clone)]
pub struct TeamMember {
    pub name: &'static str,
    pub role: &'static str,
    pub bio: &'static str,
}

/// Something the restaurant stands for.
#[derive(Clone)]
pub struct BrandValue {
    pub title: &'static str,
    pub description: &'static str,
}

const TEAM: [TeamMember; 2] = [
    TeamMember {
        name: "Mama Fatou",
        role: "Fondatrice et cheffe",
        bio: "Trente ans de recettes familiales transmises de génération en génération.",
    },
    TeamMember {
        name: "Awa",
        role: "Service et accueil",
        bio: "Veille à ce que chaque client se sente comme à la maison.",
    },
];

const VALUES: [BrandValue; 3] = [
    BrandValue {
        title: "Authenticité",
        description: "Des recettes traditionnelles préparées comme au pays.",
    },
    BrandValue {
        title: "Fraîcheur",
        description: "Des produits frais, cuisinés chaque jour sur place.",
    },
    BrandValue {
        title: "Partage",
        description: "Une cuisine généreuse, faite pour être partagée.",
    },
];

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub team: Vec<TeamMember>,
    pub values: Vec<BrandValue>,
}

/// One titled section of the menu.
#[derive(Clone)]
pub struct MenuSection {
    pub title: &'static str,
    pub items: Vec<MenuItemView>,
}

/// Menu page template.
#[derive(Template, WebTemplate)]
#[template(path = "menu.html")]
pub struct MenuTemplate {
    pub sections: Vec<MenuSection>,
}

/// Display the about page.
#[instrument]
pub async fn about() -> impl IntoResponse {
    AboutTemplate {
        team: TEAM.to_vec(),
        values: VALUES.to_vec(),
    }
}

/// Display the menu.
#[instrument(skip(state))]
pub async fn menu(State(state): State<AppState>) -> impl IntoResponse {
    let sections = [
        MenuCategory::Plat,
        MenuCategory::Accompagnement,
        MenuCategory::Boisson,
    ]
    .into_iter()
    .map(|category| MenuSection {
        title: category.label(),
        items: state
            .menu()
            .in_category(category)
            .map(MenuItemView::from)
            .collect(),
    })
    .filter(|section| !section.items.is_empty())
    .collect();

    MenuTemplate { sections }
}
