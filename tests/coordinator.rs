use super::*;

fn coordinator(server: &MockServer, addresses: &[Address], deadline: Duration) -> Coordinator {
    let fetcher = Fetcher::new(
        Arc::new(ReqwestClient::new().unwrap()),
        "127.0.0.1",
        server.port(),
        deadline,
    )
    .unwrap();

    Coordinator::new(
        fetcher,
        AddressSet::new(addresses.iter().cloned()).unwrap(),
        Duration::from_secs(60),
    )
}

#[tokio::test]
async fn refresh_over_http() {
    let server = MockServer::healthy(&[address(1)]);
    let coordinator = coordinator(&server, &[address(1)], Duration::from_secs(10));

    coordinator.first_refresh().await.unwrap();

    let snapshot = coordinator.snapshot().unwrap();
    assert!(coordinator.last_update_success());
    assert_eq!(snapshot.client[&address(1)].workers.len(), 2);
    assert_eq!(snapshot.network.blocks, Some(json!(840000)));
    assert_eq!(snapshot.info.high_scores.len(), 1);
}

#[tokio::test]
async fn network_failure_keeps_the_cycle_successful() {
    let server = MockServer::healthy(&[address(1)]);
    server.clear_network();

    let coordinator = coordinator(&server, &[address(1)], Duration::from_secs(10));
    coordinator.refresh().await.unwrap();

    let snapshot = coordinator.snapshot().unwrap();
    assert!(coordinator.last_update_success());
    assert!(snapshot.client.contains_key(&address(1)));
    assert!(snapshot.network.is_empty());
}

#[tokio::test]
async fn timeout_keeps_previous_snapshot() {
    let server = MockServer::healthy(&[address(1)]);
    let coordinator = coordinator(&server, &[address(1)], Duration::from_secs(1));

    coordinator.refresh().await.unwrap();
    let before = coordinator.snapshot().unwrap();

    server.delay(Duration::from_secs(3));

    let err = coordinator.refresh().await.unwrap_err();
    assert!(err.is_timeout());
    assert!(matches!(err, UpdateFailed::FetchTimeout { .. }));
    assert!(!coordinator.last_update_success());
    assert!(Arc::ptr_eq(&before, &coordinator.snapshot().unwrap()));
}

#[tokio::test]
async fn topology_change_over_http() {
    let server = MockServer::healthy(&[address(1)]);
    let coordinator = coordinator(&server, &[address(1)], Duration::from_secs(10));
    let mut topology = coordinator.subscribe_topology();

    coordinator.refresh().await.unwrap();

    server.client(&address(1), &[("rig1", 1.0), ("rig2", 0.0), ("rig3", 5.0)]);
    coordinator.refresh().await.unwrap();

    let changed = topology.try_recv().unwrap();
    assert_eq!(changed.addresses().collect::<Vec<_>>(), vec![&address(1)]);
    assert!(changed.new_workers[&address(1)].contains("rig3"));
    assert!(topology.try_recv().is_err());
}

#[tokio::test]
async fn removing_last_address_is_rejected() {
    let server = MockServer::healthy(&[address(1)]);
    let coordinator = coordinator(&server, &[address(1)], Duration::from_secs(10));

    assert!(coordinator.remove_address(&address(1)).is_err());
    assert_eq!(coordinator.addresses(), vec![address(1)]);
}
