//! Publish/subscribe with prefix filtering over the loopback transport.

use manifold::{create_socket, Result};

fn main() -> Result<()> {
    manifold::dev_tracing::init_tracing();

    let publisher = create_socket("pub", &[])?;
    publisher.bind_sync("loopback://market-data")?;

    let subscriber = create_socket("sub", &[])?;
    subscriber.connect("loopback://market-data")?;
    subscriber.subscribe("fx.")?;

    subscriber.on_message(|parts| {
        let topic = String::from_utf8_lossy(&parts[0]);
        let body = String::from_utf8_lossy(&parts[1]);
        println!("{topic}: {body}");
    });

    publisher.send(["fx.eurusd", "1.0842"])?;
    publisher.send(["equity.acme", "17.20"])?; // filtered out
    publisher.send(["fx.usdjpy", "151.03"])?;

    subscriber.notify_readiness()?;

    subscriber.close()?;
    publisher.close()?;
    Ok(())
}
