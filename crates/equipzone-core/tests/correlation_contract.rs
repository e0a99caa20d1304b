//! Contract Test: Record Correlation
//!
//! Verifies that a build joins address, alias, pointer and descriptive
//! records from several zones into devices.
//!
//! Constraints verified:
//! - A pointer to a device becomes a reverse address
//! - A pointer to an alias becomes a secondary mapping of the aliased device
//! - Descriptive records are attached regardless of record order
//! - Unsupported record kinds are ignored

mod common;

use common::*;
use equipzone_core::Inventory;
use equipzone_core::record::Record;

#[tokio::test]
async fn alias_pointer_becomes_secondary_mapping() {
    let transport = seeded_transport().await;
    transport
        .add_zone(
            "example.net.",
            vec![
                Record::address("host.example.net.", ip("192.168.7.1")),
                Record::alias("alt.example.net.", "host.example.net."),
            ],
        )
        .await;
    transport
        .add_zone(
            "7.168.192.in-addr.arpa.",
            vec![Record::pointer("2.7.168.192.in-addr.arpa.", "alt.example.net.")],
        )
        .await;

    let inventory = Inventory::load_local(
        &directory(&transport),
        &["example.net.".to_string()],
        &["7.168.192.in-addr.arpa.".to_string()],
    )
    .await
    .expect("build succeeds");

    assert_eq!(inventory.len(), 1);
    let device = inventory.find("host.example.net.").unwrap();
    assert_eq!(device.aliases, vec!["alt.example.net."]);
    assert_eq!(device.mapping.len(), 1);
    assert_eq!(device.mapping["alt.example.net."], ip("192.168.7.2"));
    assert!(device.reverse.is_empty());
}

#[tokio::test]
async fn fixture_devices_are_fully_correlated() {
    let transport = seeded_transport().await;

    let inventory = Inventory::load_local(&directory(&transport), &forward_zones(), &reverse_zones())
        .await
        .expect("build succeeds");

    let names: Vec<_> = inventory.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["gauge.example.com.", "host.example.com."]);

    let host = inventory.find("host.example.com.").unwrap();
    assert_eq!(host.ip, ip("192.168.1.5"));
    assert_eq!(host.reverse, vec![ip("10.1.0.8"), ip("192.168.1.5")]);
    assert_eq!(host.aliases, vec!["alt.example.com."]);
    assert!(host.has_mapping("alt.example.com.", ip("192.168.1.9")));
    assert_eq!(host.place, "Wellington Harbour");
    assert_eq!(host.model, "NetR9");
    assert!(host.has_code("wgtn"));
    assert!((host.latitude - -41.290438888888886).abs() < 1e-6);
    assert!((host.longitude - 174.7815961111111).abs() < 1e-6);
    assert!((host.height - 21.0).abs() < 0.01);

    let gauge = inventory.find("gauge.example.com.").unwrap();
    assert_eq!(gauge.reverse, vec![ip("10.1.0.7")]);
    assert!(gauge.aliases.is_empty());
    assert!(gauge.mapping.is_empty());
    assert_eq!(gauge.place, "");
}

#[tokio::test]
async fn inventory_queries_over_built_devices() {
    let transport = seeded_transport().await;
    let inventory = Inventory::load_local(&directory(&transport), &forward_zones(), &reverse_zones())
        .await
        .expect("build succeeds");

    assert_eq!(inventory.list_by_network(&"10.0.0.0/8".parse().unwrap()).len(), 2);
    assert_eq!(inventory.list_by_model("NetR9").len(), 1);
    assert_eq!(
        inventory
            .find_by_address(ip("10.1.0.7"))
            .map(|d| d.hostname()),
        Some("gauge")
    );
}

#[tokio::test]
async fn single_device_lookup_matches_build() {
    let transport = seeded_transport().await;
    let directory = directory(&transport);

    let inventory = Inventory::load_local(&directory, &forward_zones(), &reverse_zones())
        .await
        .expect("build succeeds");
    let built = inventory.find("host.example.com.").unwrap();

    let found = directory
        .find("host.example.com")
        .await
        .expect("lookup succeeds")
        .expect("device exists");
    assert!(found.is_equivalent(built));
    assert_eq!(found.place, built.place);

    let by_address = directory
        .find_by_address(ip("10.1.0.7"))
        .await
        .expect("lookup succeeds")
        .expect("device exists");
    assert_eq!(by_address.name, "gauge.example.com.");

    assert!(directory.find("missing.example.com").await.unwrap().is_none());
}
