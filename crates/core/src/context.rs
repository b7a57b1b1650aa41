//! Caller context passed into every engine operation.

use kosh_shared::types::{CompanyId, UserId};

/// The authenticated caller: which company's books are touched and by whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Tenant whose records are read and written.
    pub company_id: CompanyId,
    /// User performing the operation, recorded as `createdBy`/`issuedBy`.
    pub user_id: UserId,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(company_id: CompanyId, user_id: UserId) -> Self {
        Self {
            company_id,
            user_id,
        }
    }
}
