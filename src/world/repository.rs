use crate::core::serialization::SaveState;

/// Durable store for the single journey snapshot. The engine treats this as
/// a convenience: a failing repository degrades to in-memory play.
pub trait SaveRepository {
    fn load(&mut self) -> Result<Option<SaveState>, Box<dyn std::error::Error>>;
    fn store(&mut self, state: &SaveState) -> Result<(), Box<dyn std::error::Error>>;
}
