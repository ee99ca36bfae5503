mod maybe_done;
pub use maybe_done::MaybeDone;
