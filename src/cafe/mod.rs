mod collect;
mod error;
mod node;
mod palette;
mod parse;

pub use collect::{CafeDataset, DatasetSource, load_dataset};
pub use node::{
    CafeNode, DEFAULT_EVENT_COLOR, EventNode, GeoPoint, PaymentMethod, build_events, build_nodes,
};
pub use palette::faculty_color;
pub use parse::RawCafe;
