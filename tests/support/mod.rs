//! Deterministic collaborators and a running server for end-to-end tests.

use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use geoip_transport_map::{
    destination::DestinationTable,
    error::LookupError,
    listener::accept_loop,
    resolver::Resolver,
    traits::{CountryLookup, Dns},
};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};

#[derive(Debug, Default)]
pub struct FixedDns {
    mx: HashMap<String, Vec<String>>,
    addresses: HashMap<String, Vec<IpAddr>>,
}

impl FixedDns {
    pub fn mx(mut self, domain: &str, hosts: &[&str]) -> Self {
        self.mx.insert(
            domain.to_string(),
            hosts.iter().map(ToString::to_string).collect(),
        );
        self
    }

    pub fn host(mut self, host: &str, address: IpAddr) -> Self {
        self.addresses
            .entry(host.to_string())
            .or_default()
            .push(address);
        self
    }
}

impl Dns for FixedDns {
    async fn resolve_mx(&self, domain: &str) -> Result<Vec<String>, LookupError> {
        self.mx
            .get(domain)
            .cloned()
            .ok_or_else(|| LookupError::NoRecords(domain.to_string()))
    }

    async fn resolve_addresses(&self, host: &str) -> Result<Vec<IpAddr>, LookupError> {
        self.addresses
            .get(host)
            .cloned()
            .ok_or_else(|| LookupError::NoRecords(host.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct FixedGeo {
    countries: HashMap<IpAddr, String>,
    pub queries: AtomicUsize,
}

impl FixedGeo {
    pub fn country(mut self, ip: IpAddr, code: &str) -> Self {
        self.countries.insert(ip, code.to_string());
        self
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl CountryLookup for FixedGeo {
    fn country_of(&self, ip: IpAddr) -> Result<String, LookupError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.countries
            .get(&ip)
            .cloned()
            .ok_or(LookupError::CountryNotFound(ip))
    }
}

/// A transport map server on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub geo: Arc<FixedGeo>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(table: DestinationTable, dns: FixedDns, geo: FixedGeo) -> Self {
        let geo = Arc::new(geo);
        let resolver = Arc::new(Resolver::new(Arc::new(table), dns, Arc::clone(&geo)));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(accept_loop(listener, resolver));

        Self { addr, geo, handle }
    }

    pub async fn connect(&self) -> Client {
        let stream = TcpStream::connect(self.addr).await.unwrap();
        Client {
            stream: BufReader::new(stream),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct Client {
    stream: BufReader<TcpStream>,
}

impl Client {
    /// Send one request line and return the raw response line, terminator included.
    pub async fn query(&mut self, address: &str) -> String {
        self.stream
            .get_mut()
            .write_all(format!("{address}\n").as_bytes())
            .await
            .unwrap();

        let mut response = String::new();
        self.stream.read_line(&mut response).await.unwrap();
        response
    }
}
