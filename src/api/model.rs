use crate::error::Error;
use std::net::IpAddr;

/// Query parameters of a `/v3/update` request.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub(super) struct UpdateQuery {
    pub hostname: String,
    pub myip: String,
}

impl UpdateQuery {
    /// Build from decoded query pairs. When a key repeats, its first value is used.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut hostname = None;
        let mut myip = None;
        for (key, value) in pairs {
            match key.as_str() {
                "hostname" => {
                    hostname.get_or_insert(value);
                }
                "myip" => {
                    myip.get_or_insert(value);
                }
                _ => {}
            }
        }
        Self {
            hostname: hostname.unwrap_or_default(),
            myip: myip.unwrap_or_default(),
        }
    }

    /// Parse the comma separated `myip` list, dropping unspecified addresses.
    pub fn addresses(&self) -> Result<Vec<IpAddr>, Error> {
        if self.myip.is_empty() {
            return Err(Error::MissingAddress);
        }
        let mut addrs = Vec::new();
        for raw in self.myip.split(',') {
            let ip: IpAddr = raw
                .parse()
                .map_err(|_| Error::InvalidAddress(raw.to_string()))?;
            if !ip.is_unspecified() {
                addrs.push(ip);
            }
        }
        if addrs.is_empty() {
            return Err(Error::NoSpecifiedAddress(self.myip.clone()));
        }
        Ok(addrs)
    }
}
