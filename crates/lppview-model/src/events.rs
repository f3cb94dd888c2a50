/// Structural-change notification for display layers.
///
/// Events carry only the affected index; a consumer drains the queue after
/// mutating the system and re-queries it for current state. This replaces
/// subclass hooks so the math core stays free of display coupling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEvent {
    /// A plane was appended at the given index
    PlaneAdded(usize),
    /// The plane at the given index was overwritten in place
    PlaneUpdated(usize),
    /// The plane at the given index was erased; later indices shifted down
    PlaneRemoved(usize),
    /// A solve completed and the stored solution was replaced
    SolutionSolved,
}
