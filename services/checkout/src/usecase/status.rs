use uuid::Uuid;

use storefront_domain::id::CheckoutJobId;

use crate::domain::repository::JobStatusStore;
use crate::domain::types::JobStatusRecord;
use crate::error::CheckoutServiceError;

pub struct Caller {
    pub user_id: Uuid,
    pub is_admin: bool,
}

pub struct GetJobStatusUseCase<S: JobStatusStore> {
    pub statuses: S,
}

impl<S: JobStatusStore> GetJobStatusUseCase<S> {
    /// Unknown, expired and not-yet-visible jobs all read as `JobNotFound`; only the
    /// owner or an admin may see a record.
    pub async fn execute(
        &self,
        caller: Caller,
        job_id: &str,
    ) -> Result<JobStatusRecord, CheckoutServiceError> {
        let job_id: CheckoutJobId = job_id
            .parse()
            .map_err(|_| CheckoutServiceError::JobNotFound)?;
        let record = self
            .statuses
            .get(job_id)
            .await?
            .ok_or(CheckoutServiceError::JobNotFound)?;
        if record.user_id != caller.user_id && !caller.is_admin {
            return Err(CheckoutServiceError::Forbidden);
        }
        Ok(record)
    }
}
