//! Static seed list standing in for the remote store catalog.

use once_cell::sync::Lazy;

use super::models::Item;

pub static ITEMS: Lazy<Vec<Item>> = Lazy::new(|| {
    [
        ("Running Shoes Run Active", "Kalenji", 49.99),
        ("Trail Running Shoes XT8", "Evadict", 89.99),
        ("Hiking Backpack 20L", "Quechua", 24.99),
        ("Hiking Backpack 40L", "Quechua", 59.99),
        ("Camping Tent 2 Person", "Quechua", 69.99),
        ("Sleeping Bag 10 Degrees", "Forclaz", 34.99),
        ("Road Bike Triban RC120", "Triban", 499.0),
        ("Mountain Bike ST 100", "Rockrider", 349.0),
        ("Bike Helmet 500", "Btwin", 19.99),
        ("Yoga Mat Comfort", "Kimjaly", 14.99),
        ("Dumbbell Kit 20kg", "Domyos", 49.99),
        ("Football Size 5", "Kipsta", 9.99),
        ("Basketball Size 7", "Tarmak", 14.99),
        ("Tennis Racket TR100", "Artengo", 29.99),
        ("Badminton Racket BR190", "Perfly", 12.99),
        ("Swimming Goggles", "Nabaiji", 7.99),
        ("Swim Shorts", "Nabaiji", 12.99),
        ("Fleece Jacket MH120", "Quechua", 14.99),
        ("Rain Jacket Waterproof", "Forclaz", 39.99),
        ("Trekking Poles", "Forclaz", 24.99),
        ("Fishing Rod Set", "Caperlan", 44.99),
        ("Kayak Paddle", "Itiwit", 29.99),
        ("Ski Goggles G500", "Wedze", 34.99),
        ("Climbing Harness", "Simond", 49.99),
        ("Skipping Rope", "Domyos", 4.99),
    ]
    .into_iter()
    .map(|(name, brand, price)| Item::new(name, brand, price))
    .collect()
});
