use crate::core::components::types::ComponentError;
use crate::core::types::ComponentId;

/// Pull side of a connection: something downstream entities draw finished
/// goods from
///
/// Machines implement this for their stored output. A downstream machine
/// or truck only ever holds the [`ComponentId`] of its source; the owner of
/// both entities lends the source for the duration of one call.
pub trait MaterialSource {
    /// Identifier used to check the wiring
    fn source_id(&self) -> &ComponentId;

    /// Take up to `max_quantity`, returning how much was actually taken
    ///
    /// Never blocks; a shortfall is signalled by returning less than asked.
    fn retrieve_quantity(&mut self, max_quantity: f64) -> f64;
}

/// Push side of a connection: the receiver of delivered goods
pub trait Consignee {
    /// Identifier used to check the wiring
    fn consignee_id(&self) -> &ComponentId;

    /// Record a delivered quantity and return the payment it earned
    fn quantity_shipped(&mut self, quantity: f64) -> Result<f64, ComponentError>;
}

/// Check that `supplied` is the peer an entity was wired to
pub(crate) fn check_wiring(
    owner: &ComponentId,
    expected: &ComponentId,
    supplied: &ComponentId,
) -> Result<(), ComponentError> {
    if expected == supplied {
        Ok(())
    } else {
        Err(ComponentError::WiringMismatch(format!(
            "{} {} is wired to {} but was given {}",
            owner.kind(),
            owner,
            expected,
            supplied
        )))
    }
}
