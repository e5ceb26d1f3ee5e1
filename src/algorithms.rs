mod bowyer_watson;
mod flips;
pub mod locate;
mod segments;
pub mod triangulate;
