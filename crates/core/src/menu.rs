//! The restaurant menu.
//!
//! The menu is static data compiled into the binary; cart lines reference
//! dishes by their slug.

use serde::{Deserialize, Serialize};

use crate::types::Price;

/// Menu section a dish is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuCategory {
    Plat,
    Accompagnement,
    Boisson,
}

impl MenuCategory {
    /// Heading shown on the menu page.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Plat => "Plats signature",
            Self::Accompagnement => "Accompagnements",
            Self::Boisson => "Boissons maison",
        }
    }
}

/// A single dish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// URL-safe identifier, e.g. `yassa-poulet`.
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: MenuCategory,
    /// Shown in the home page "signature" carousel.
    pub featured: bool,
}

/// The full menu.
#[derive(Debug, Clone)]
pub struct Menu {
    items: Vec<MenuItem>,
}

impl Menu {
    /// Build a menu from a list of dishes.
    #[must_use]
    pub const fn new(items: Vec<MenuItem>) -> Self {
        Self { items }
    }

    /// Look up a dish by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// All dishes, in menu order.
    #[must_use]
    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// Dishes in one category, in menu order.
    pub fn in_category(&self, category: MenuCategory) -> impl Iterator<Item = &MenuItem> {
        self.items.iter().filter(move |item| item.category == category)
    }

    /// Dishes highlighted on the home page.
    pub fn featured(&self) -> impl Iterator<Item = &MenuItem> {
        self.items.iter().filter(|item| item.featured)
    }
}

impl Default for Menu {
    fn default() -> Self {
        let dish = |id: &str, name: &str, description: &str, cents, category, featured| MenuItem {
            id: id.to_owned(),
            name: name.to_owned(),
            description: description.to_owned(),
            price: Price::eur_cents(cents),
            category,
            featured,
        };

        Self::new(vec![
            dish(
                "yassa-poulet",
                "Yassa Poulet",
                "Poulet mariné au citron et aux oignons confits, riz blanc",
                1450,
                MenuCategory::Plat,
                true,
            ),
            dish(
                "poulet-braise",
                "Poulet Braisé",
                "Poulet grillé au feu de bois, sauce pimentée maison",
                1500,
                MenuCategory::Plat,
                true,
            ),
            dish(
                "poisson-grille",
                "Poisson Grillé",
                "Tilapia entier grillé, oignons et tomates fraîches",
                1650,
                MenuCategory::Plat,
                true,
            ),
            dish(
                "mafe",
                "Mafé",
                "Ragoût de boeuf à la sauce d'arachide",
                1550,
                MenuCategory::Plat,
                false,
            ),
            dish(
                "thieboudienne",
                "Thiéboudienne",
                "Riz au poisson et légumes, recette sénégalaise",
                1700,
                MenuCategory::Plat,
                false,
            ),
            dish(
                "alloco",
                "Alloco",
                "Bananes plantain frites",
                500,
                MenuCategory::Accompagnement,
                false,
            ),
            dish(
                "attieke",
                "Attiéké",
                "Semoule de manioc fermentée",
                450,
                MenuCategory::Accompagnement,
                false,
            ),
            dish(
                "bissap",
                "Jus de Bissap",
                "Infusion d'hibiscus glacée",
                350,
                MenuCategory::Boisson,
                false,
            ),
            dish(
                "gingembre",
                "Jus de Gingembre",
                "Gingembre frais pressé, citron vert",
                350,
                MenuCategory::Boisson,
                false,
            ),
        ])
    }
}
