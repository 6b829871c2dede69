mod seller_selector;

pub use seller_selector::{SellerSelector, inverse_load_weight, select_with};
