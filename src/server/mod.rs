pub mod router;

pub use router::{ShelfState, shelf_router};
