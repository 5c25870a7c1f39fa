use {
    super::*,
    http_server::error::{OptionExt, ServerError, ServerResult},
};

#[derive(Clone)]
pub(crate) struct Api {
    coordinator: Coordinator,
    registrar: Arc<Mutex<Registrar>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub entry: String,
    pub last_update_success: bool,
    pub last_error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub cycles: u64,
    pub addresses: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub error: Option<String>,
    pub cycles: u64,
    pub sensors_added: usize,
}

#[derive(Debug, Deserialize)]
struct RefreshQuery {
    entry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddAddress {
    address: String,
}

pub(crate) fn router(coordinator: Coordinator, registrar: Arc<Mutex<Registrar>>) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/sensors", get(sensors))
        .route("/api/snapshot", get(snapshot))
        .route("/api/refresh", post(refresh))
        .route("/api/addresses", get(addresses).post(add_address))
        .route("/api/addresses/{address}", delete(remove_address))
        .with_state(Api {
            coordinator,
            registrar,
        })
}

impl Api {
    async fn refresh(&self) -> RefreshResponse {
        let result = self.coordinator.refresh().await;

        let sensors_added = match self.coordinator.snapshot() {
            Some(snapshot) if result.is_ok() => self.registrar.lock().register(&snapshot).len(),
            _ => 0,
        };

        RefreshResponse {
            success: result.is_ok(),
            error: result.err().map(|err| err.to_string()),
            cycles: self.coordinator.status().cycles,
            sensors_added,
        }
    }
}

fn parse_address(address: &str) -> ServerResult<Address> {
    address
        .parse::<Address>()
        .map_err(|err| ServerError::BadRequest(err.to_string()))
}

async fn status(State(api): State<Api>) -> ServerResult<Response> {
    let status = api.coordinator.status();

    Ok(Json(StatusResponse {
        entry: api.coordinator.entry_id().into(),
        last_update_success: status.last_update_success,
        last_error: status.last_error.map(|err| err.to_string()),
        last_updated: status.last_updated,
        cycles: status.cycles,
        addresses: api.coordinator.addresses(),
    })
    .into_response())
}

async fn sensors(State(api): State<Api>) -> ServerResult<Response> {
    let status = api.coordinator.status();
    let readings = api
        .registrar
        .lock()
        .readings(&Projection::from_status(&status));

    Ok(Json(readings).into_response())
}

async fn snapshot(State(api): State<Api>) -> ServerResult<Response> {
    let snapshot = api.coordinator.snapshot().ok_or_not_found(|| "Snapshot")?;

    Ok(Json(&*snapshot).into_response())
}

async fn refresh(
    State(api): State<Api>,
    Query(query): Query<RefreshQuery>,
) -> ServerResult<Response> {
    if let Some(entry) = query.entry
        && entry != api.coordinator.entry_id()
    {
        return Err(ServerError::NotFound(format!("Entry {entry} not found")));
    }

    Ok(Json(api.refresh().await).into_response())
}

async fn addresses(State(api): State<Api>) -> ServerResult<Response> {
    Ok(Json(api.coordinator.addresses()).into_response())
}

async fn add_address(
    State(api): State<Api>,
    Json(body): Json<AddAddress>,
) -> ServerResult<Response> {
    let address = parse_address(&body.address)?;

    api.coordinator.add_address(address)?;

    Ok(Json(api.refresh().await).into_response())
}

async fn remove_address(
    State(api): State<Api>,
    Path(address): Path<String>,
) -> ServerResult<Response> {
    let address = parse_address(&address)?;

    api.coordinator.remove_address(&address)?;

    Ok(Json(api.refresh().await).into_response())
}
