pub mod client;
pub mod login;

pub use client::{
    ApiResult, ClaimsPayload, Credentials, InsurerPayload, LoginResponse, PatientDetails,
    PortalClient, SubmissionResponse,
};
pub use login::{EndpointLogin, LoginStrategy, LoginSuccess, default_strategies, login_in_order};
