use super::*;

/// Why a whole fetch cycle was abandoned.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum UpdateFailed {
    #[snafu(display(
        "Timeout connecting to mining server at {server} after {}s",
        deadline.as_secs_f64()
    ))]
    FetchTimeout { server: String, deadline: Duration },

    #[snafu(display("Error fetching {endpoint} from {url}: {message}"))]
    FetchError {
        endpoint: Endpoint,
        url: String,
        message: String,
    },
}

impl UpdateFailed {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::FetchTimeout { .. })
    }
}

/// A single endpoint answered with something other than 200. Logged, never
/// returned: the rest of the cycle carries on.
#[derive(Debug, Snafu)]
#[snafu(display("Failed to fetch {endpoint}: {status}"))]
pub struct EndpointUnavailable {
    pub endpoint: Endpoint,
    pub status: u16,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProbeError {
    #[snafu(display("Cannot connect to mining server at {server}: {message}"))]
    CannotConnect { server: String, message: String },

    #[snafu(display("Mining server at {server} rejected address {address} with status {status}"))]
    InvalidAddress {
        server: String,
        address: Address,
        status: u16,
    },
}
