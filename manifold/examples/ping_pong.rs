//! Request/reply over the in-process loopback transport.
//!
//! Run with `RUST_LOG=trace cargo run --example ping_pong` to watch the
//! dispatch engine work.

use manifold::{create_socket, Result};

fn main() -> Result<()> {
    manifold::dev_tracing::init_tracing();

    let server = create_socket("rep", &[])?;
    server.bind_sync("loopback://ping-pong")?;

    let replier = server.clone();
    server.on_message(move |parts| {
        let request = String::from_utf8_lossy(&parts[0]).into_owned();
        println!("server <- {request}");
        if let Err(error) = replier.send(["pong"]) {
            eprintln!("server reply failed: {error}");
        }
    });

    let client = create_socket("req", &[])?;
    client.connect("loopback://ping-pong")?;
    client.on_message(|parts| {
        println!("client <- {}", String::from_utf8_lossy(&parts[0]));
    });

    for round in 0..3 {
        println!("round {round}");
        client.send(["ping"])?;
        // No embedding event loop here, so readiness is pumped by hand.
        server.notify_readiness()?;
        client.notify_readiness()?;
    }

    client.close()?;
    server.close()?;
    Ok(())
}
