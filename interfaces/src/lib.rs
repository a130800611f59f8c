pub mod defs;

pub use defs::{
    AggregatedSet, Column, DigestSection, DumpRecord, FeedItem, FrontMatter, RawEntry, Summary,
    UnitStatus,
};
