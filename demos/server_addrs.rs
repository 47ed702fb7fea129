use sysresolv::{MemoryStore, ServerAddrsQuery, DNS_STATE_KEY};

fn main() -> sysresolv::Result<()> {
    env_logger::init();

    match sysresolv::server_addrs() {
        Ok(servers) => {
            println!("System DNS Servers:");
            for server in servers {
                println!("  {server}");
            }
        }
        Err(e) => println!("System DNS Servers unavailable: {e}"),
    }

    // The same query against an in-memory store
    let store = MemoryStore::with_server_addresses(
        DNS_STATE_KEY,
        &["192.168.1.1", "not-an-address", "2606:4700:4700::1111"],
    );
    println!("\nIn-memory store:");
    for server in ServerAddrsQuery::new().run(&store)? {
        println!("  {server}");
    }

    Ok(())
}
