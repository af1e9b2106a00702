pub mod categories;
pub mod media;
pub mod navigation;
pub mod pages;
pub mod posts;
pub mod stats;
pub mod tags;
pub mod widgets;
