//! Name pools and the built-in water source sites.

use tembo_core::Capacity;

pub const ELEPHANT_NAMES: [&str; 20] = [
    "Ella", "Emma", "Eric", "Elsa", "Emily", "Ethan", "Eva", "Eddie", "Elena", "Eli", "Ember",
    "Enzo", "Eden", "Ezra", "Eleanor", "Emmett", "Evelyn", "Elliot", "Esther", "Everett",
];

/// `(name, latitude, longitude, capacity)`; stored with x = longitude.
pub const WATER_SOURCES: [(&str, f64, f64, Capacity); 10] = [
    ("Okavango River", -19.0, 22.5, Capacity::Large),
    ("Chobe Waterhole", -18.5, 24.0, Capacity::Medium),
    ("Savuti Marsh", -18.5, 24.1, Capacity::Medium),
    ("Linyanti Springs", -18.3, 23.8, Capacity::Small),
    ("Moremi Delta", -19.3, 23.0, Capacity::Large),
    ("Khwai Pools", -19.1, 23.8, Capacity::Medium),
    ("Makgadikgadi Pans", -20.5, 25.0, Capacity::Small),
    ("Nxai Pan", -20.1, 24.7, Capacity::Small),
    ("Boteti River", -20.3, 24.5, Capacity::Large),
    ("Zambezi Waters", -17.8, 25.3, Capacity::Large),
];

pub const TERRITORIES: [&str; 8] = [
    "Northern Savanna",
    "Central Plains",
    "Southern Grasslands",
    "Eastern Woodlands",
    "Western Wetlands",
    "Delta Region",
    "Mountain Foothills",
    "Coastal Lowlands",
];
