#![cfg(feature = "memcache")]

use memfacade::{
    transport::{memcache::MemcacheTransport, Transport},
    CacheContract, CacheFacade, FacadeConfig, Server, Ttl,
};
use std::time::Duration;

fn facade(prefix: &str) -> CacheFacade<MemcacheTransport> {
    let config = FacadeConfig::new()
        .with_prefix(prefix)
        .with_server(Server::new("127.0.0.1", 11211))
        .with_option("timeout", "1");
    CacheFacade::memcached(config)
}

#[test]
fn construction_does_not_connect() {
    let config = FacadeConfig::new()
        .with_prefix("test.")
        .with_server(Server::new("127.0.0.1", 1))
        .with_option("timeout", "0.1");
    let cache = CacheFacade::memcached(config);

    assert_eq!(cache.prefix(), "test.");
    assert_eq!(cache.transport().servers(), vec![Server::new("127.0.0.1", 1)]);
    assert_eq!(cache.transport().option("timeout"), Some("0.1".to_string()));
}

#[test]
fn no_servers() {
    let cache = CacheFacade::memcached(FacadeConfig::new());
    assert!(!cache.has("a").unwrap());
    assert!(!cache.clear());
    let got = cache.get_multiple(["a"], 0u8).unwrap();
    assert_eq!(got["a"], 0);
}

#[test]
#[ignore = "needs memcached on 127.0.0.1:11211"]
fn scenario() {
    let cache = facade("test.");
    let _ = cache.delete("a");

    assert!(cache.set("a", &"1".to_string(), None).unwrap());
    assert_eq!(cache.get("a", String::new()).unwrap(), "1");
    assert!(cache.delete("a").unwrap());
    assert_eq!(cache.get("a", "miss".to_string()).unwrap(), "miss");
    assert!(cache.delete("a").unwrap());
}

#[test]
#[ignore = "needs memcached on 127.0.0.1:11211"]
fn bulk_and_ttl() {
    let cache = facade("memfacade.bulk.");
    cache.delete_multiple(["k1", "k2", "k3"]).unwrap();

    assert!(cache
        .set_multiple([("k2", 2u32)], Some(Ttl::Interval(Duration::from_secs(60))))
        .unwrap());
    let got = cache.get_multiple(["k1", "k2", "k3"], 0u32).unwrap();
    assert_eq!(got.len(), 3);
    assert_eq!(got["k1"], 0);
    assert_eq!(got["k2"], 2);
    assert_eq!(got["k3"], 0);

    assert!(cache.set("k2", &9u32, Some(Ttl::Seconds(0))).unwrap());
    assert!(!cache.has("k2").unwrap());

    cache.set("falsy", &false, None).unwrap();
    assert!(cache.has("falsy").unwrap());
    assert!(!cache.get("falsy", true).unwrap());
    assert!(cache.delete_multiple(["falsy", "k1"]).unwrap());
}

#[test]
#[ignore = "needs memcached on 127.0.0.1:11211"]
fn from_client() {
    let client = memcache::connect("memcache://127.0.0.1:11211").unwrap();
    let cache = CacheFacade::new(MemcacheTransport::from_client(client), FacadeConfig::new());
    assert!(cache.set("memfacade.from_client", &1u8, None).unwrap());
    assert!(cache.delete("memfacade.from_client").unwrap());
}
