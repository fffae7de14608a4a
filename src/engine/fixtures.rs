use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::config::EngineSettings;
use crate::geo::Coordinate;
use crate::models::catalog::{MenuItem, MenuOption, Restaurant};
use crate::models::coupon::Coupon;
use crate::models::courier::Courier;
use crate::models::customer::Customer;
use crate::models::order::{Order, OrderLine, OrderStatus};
use crate::state::AppState;
use crate::store::memory::MemoryStore;

pub const RESTAURANT: Uuid = Uuid::from_u128(0x100);
pub const OTHER_RESTAURANT: Uuid = Uuid::from_u128(0x101);
pub const UNLOCATED_RESTAURANT: Uuid = Uuid::from_u128(0x102);
pub const CUSTOMER: Uuid = Uuid::from_u128(0x200);
pub const UNLOCATED_CUSTOMER: Uuid = Uuid::from_u128(0x201);
pub const DOSA: Uuid = Uuid::from_u128(0x300);
pub const DOSA_BUTTER: Uuid = Uuid::from_u128(0x301);
pub const BIRYANI: Uuid = Uuid::from_u128(0x302);
pub const NOODLES: Uuid = Uuid::from_u128(0x303);
pub const SOUP: Uuid = Uuid::from_u128(0x304);
pub const COUPON: Uuid = Uuid::from_u128(0x400);
pub const ORDER: Uuid = Uuid::from_u128(0x500);
pub const NEAR_COURIER: Uuid = Uuid::from_u128(0x600);
pub const MID_COURIER: Uuid = Uuid::from_u128(0x601);
pub const FAR_COURIER: Uuid = Uuid::from_u128(0x602);
pub const OFF_DUTY_COURIER: Uuid = Uuid::from_u128(0x603);

/// Restaurant at (0, 0.1), customer at (0, 0): about 11.1 km apart.
pub fn restaurant_location() -> Coordinate {
    Coordinate::new(0.0, 0.1)
}

pub fn customer_location() -> Coordinate {
    Coordinate::new(0.0, 0.0)
}

fn restaurant(id: Uuid, name: &str, location: Option<Coordinate>) -> Restaurant {
    Restaurant {
        id,
        name: name.to_string(),
        phone: Some("+91 80 1234 5678".to_string()),
        address: Some("12 MG Road".to_string()),
        location,
    }
}

fn item(id: Uuid, restaurant_id: Uuid, name: &str, price: i64, options: Vec<MenuOption>) -> MenuItem {
    MenuItem {
        id,
        restaurant_id,
        name: name.to_string(),
        image: Some(format!("{name}.png")),
        price,
        options,
    }
}

fn courier(id: Uuid, name: &str, location: Option<Coordinate>, active: bool) -> Courier {
    Courier {
        id,
        name: name.to_string(),
        phone: None,
        location,
        active,
        updated_at: Utc::now(),
    }
}

pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();

    store.upsert_restaurant(restaurant(RESTAURANT, "Dosa Corner", Some(restaurant_location())));
    store.upsert_restaurant(restaurant(
        OTHER_RESTAURANT,
        "Noodle Bar",
        Some(Coordinate::new(0.01, 0.1)),
    ));
    store.upsert_restaurant(restaurant(UNLOCATED_RESTAURANT, "Pop-up Kitchen", None));

    store.upsert_menu_item(item(
        DOSA,
        RESTAURANT,
        "Masala Dosa",
        100,
        vec![MenuOption {
            id: DOSA_BUTTER,
            name: "Butter".to_string(),
            surcharge: 10,
        }],
    ));
    store.upsert_menu_item(item(BIRYANI, RESTAURANT, "Biryani", 250, Vec::new()));
    store.upsert_menu_item(item(NOODLES, OTHER_RESTAURANT, "Hakka Noodles", 150, Vec::new()));
    store.upsert_menu_item(item(SOUP, UNLOCATED_RESTAURANT, "Rasam", 60, Vec::new()));

    store.upsert_customer(Customer {
        id: CUSTOMER,
        name: "Asha".to_string(),
        phone: Some("+91 98450 00000".to_string()),
        address: Some("4th Cross, Indiranagar".to_string()),
        location: Some(customer_location()),
    });
    store.upsert_customer(Customer {
        id: UNLOCATED_CUSTOMER,
        name: "Kiran".to_string(),
        phone: None,
        address: None,
        location: None,
    });

    store.upsert_coupon(Coupon {
        id: COUPON,
        code: "SAVE10".to_string(),
        percentage: 10,
        max_discount_amount: Some(40),
        min_cart_amount: Some(300),
        expires_at: None,
        active: true,
    });

    store.upsert_order(Order {
        id: ORDER,
        customer_id: CUSTOMER,
        restaurant_id: RESTAURANT,
        lines: vec![OrderLine {
            name: "Masala Dosa".to_string(),
            quantity: 2,
            amount: 200,
        }],
        total_amount: 234,
        status: OrderStatus::Confirmed,
        created_at: Utc::now(),
    });

    // Restaurant sits at lat 0.1; one hundredth of a degree is ~1.1 km.
    store.upsert_courier(courier(NEAR_COURIER, "Near", Some(Coordinate::new(0.0, 0.11)), true));
    store.upsert_courier(courier(MID_COURIER, "Mid", Some(Coordinate::new(0.0, 0.15)), true));
    store.upsert_courier(courier(FAR_COURIER, "Far", Some(Coordinate::new(0.0, 0.3)), true));
    store.upsert_courier(courier(
        OFF_DUTY_COURIER,
        "Off duty",
        Some(Coordinate::new(0.0, 0.1)),
        false,
    ));

    store
}

pub fn state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(seeded_store());
    (AppState::new(EngineSettings::default(), store.clone(), 64), store)
}
