pub mod names;
pub mod numeric;

pub use names::{
    extract_building_types, extract_compare_names, extract_known_building, extract_street,
};
pub use numeric::{
    extract_height_comparator, extract_top_count, height_range_or_default, HeightComparator,
};
