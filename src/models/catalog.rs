use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub location: Option<Coordinate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuOption {
    pub id: Uuid,
    pub name: String,
    /// Flat amount added once per cart line.
    #[serde(default)]
    pub surcharge: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: i64,
    #[serde(default)]
    pub options: Vec<MenuOption>,
}

impl MenuItem {
    pub fn option(&self, option_id: Uuid) -> Option<&MenuOption> {
        self.options.iter().find(|option| option.id == option_id)
    }
}
