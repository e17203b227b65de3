//! Builder-owns-resource checks (§4.3)

use crate::entities::{Collection, Query};
use crate::error::{AppError, AppResult};
use crate::ids::Did;

pub fn require_owns_collection(caller: &Did, collection: &Collection) -> AppResult<()> {
    if &collection.owner == caller {
        Ok(())
    } else {
        Err(AppError::ResourceAccessDenied(format!(
            "caller does not own collection {}",
            collection.meta.id
        )))
    }
}

pub fn require_owns_query(caller: &Did, query: &Query) -> AppResult<()> {
    if &query.owner == caller {
        Ok(())
    } else {
        Err(AppError::ResourceAccessDenied(format!(
            "caller does not own query {}",
            query.meta.id
        )))
    }
}
