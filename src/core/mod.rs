pub mod catch_record;
pub mod ranked;
pub mod search_hit;

pub use catch_record::{CatchRecord, Dataset, SpeciesCatch};
pub use ranked::{RankedDataset, RankedRecord};
pub use search_hit::SearchHit;
