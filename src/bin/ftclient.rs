use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::net::ToSocketAddrs;
use std::path::Path;
use std::time::Duration;

use ftserve::cli::ClientOpts;
use ftserve::client::{Client, Request, Response};

fn main() -> Result<()> {
    let opts = ClientOpts::parse();

    let server = (opts.server.as_str(), opts.server_port)
        .to_socket_addrs()
        .with_context(|| format!("resolve {}", opts.server))?
        .find(|a| a.is_ipv4())
        .with_context(|| format!("no IPv4 address for {}", opts.server))?;

    let request = if opts.list {
        Request::List
    } else if let Some(ref name) = opts.get {
        // Refuse before asking the server, so nothing is transferred for nothing
        if Path::new(name).exists() && !opts.force {
            anyhow::bail!("{} already exists locally (use --force to overwrite)", name);
        }
        Request::Get(name.clone())
    } else {
        Request::Nothing
    };

    let mut client = Client::new(server, opts.data_port);
    client.timeout = opts.timeout_ms.map(Duration::from_millis);

    match client.request(&request)? {
        Response::Listing(names) => {
            println!("Receiving directory structure from {}:{}", opts.server, opts.data_port);
            for name in names {
                println!("{}", name);
            }
        }
        Response::File(body) => {
            let name = opts.get.as_deref().unwrap_or_default();
            let mut f = std::fs::File::create(name).with_context(|| format!("create {}", name))?;
            f.write_all(&body).with_context(|| format!("write {}", name))?;
            println!("File transfer complete: {} ({} bytes)", name, body.len());
        }
        Response::NotFound => {
            eprintln!("{}:{} says FILE NOT FOUND", opts.server, opts.data_port);
            std::process::exit(1);
        }
        Response::Unknown => {
            eprintln!("{}:{} says UNKNOWN COMMAND", opts.server, opts.data_port);
            std::process::exit(1);
        }
    }
    Ok(())
}
