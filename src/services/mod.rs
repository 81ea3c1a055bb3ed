//! Operations on the service's endpoint families, as methods of [`FcmClient`](crate::FcmClient).

pub mod groups;
pub mod instance_id;
