//! Read model trait for query-side views.

/// Query side of a projection: the rows the HTTP listings read.
pub trait ReadModel: Send + Sync {
    /// Returns the name of this read model.
    fn name(&self) -> &'static str;

    /// Number of rows; zero while a writer holds the view.
    fn count(&self) -> usize;
}
