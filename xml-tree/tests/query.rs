use std::path::PathBuf;

use pretty_assertions::assert_eq;
use xml_tree::{parse_file, Pattern};

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn staticmaps_are_found_across_interfaces() {
    let root = parse_file(&fixture("fixtures/pfsense-unbound.xml")).expect("parse");
    let pattern = Pattern::parse(".//dhcpd//staticmap").expect("pattern");
    let macs: Vec<_> = root
        .select(&pattern)
        .iter()
        .filter_map(|s| s.node.child_text("mac"))
        .collect();
    assert_eq!(
        macs,
        vec!["aa:bb:cc:00:00:01", "aa:bb:cc:00:00:02", "aa:bb:cc:00:00:03"]
    );
}

#[test]
fn unbound_hosts_pattern_ignores_dnsmasq_layout() {
    let root = parse_file(&fixture("fixtures/pfsense-hosts.xml")).expect("parse");
    assert!(root.find_all(".//unbound/hosts").expect("query").is_empty());

    let hosts = root.find_all(".//hosts/host").expect("query");
    assert_eq!(hosts.len(), 2);
    assert_eq!(hosts[0].path(), "pfsense/dnsmasq/hosts/host[1]");
    assert_eq!(hosts[1].node.child_text("host"), Some("switch"));
}
