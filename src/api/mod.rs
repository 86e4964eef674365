//! HTTP API speaking the dyndns v3 update protocol.
//!
//! # API Endpoints
//!
//! ## `/v3/update` (GET)
//!
//!   Expects HTTP Basic-Auth credentials of a configured user and the query parameters
//!   `hostname` (the FQDN to update) and `myip` (one or more comma separated IPv4/IPv6
//!   addresses):
//!
//!   ```bash
//!   ❯ curl -u alice:secret 'http://localhost:8080/v3/update?hostname=home.example.com&myip=198.51.100.1,2001:db8::1'
//!   good 198.51.100.1,2001:db8::1
//!   ```
//!
//!   The hostname must be on the user's allow-list. Unspecified addresses (`0.0.0.0`, `::`) are
//!   ignored. The zone owning the hostname is looked up at the provider and the hostname's `A`
//!   and/or `AAAA` records are set to exactly the given addresses.
//!
//!   Responses are plain text:
//!
//!   | Status | Body           | When                                                    |
//!   |--------|----------------|---------------------------------------------------------|
//!   | 200    | `good <myip>`  | records were set                                        |
//!   | 401    | `badauth`      | credentials missing, malformed or wrong                 |
//!   | 403    | `badauth`      | hostname not on the user's allow-list                   |
//!   | 400    | `notfqdn`      | `hostname` missing                                      |
//!   | 400    | `badrequest`   | `myip` missing, unparseable, or only unspecified        |
//!   | 400    | `dnserr`       | no provider zone owns the hostname                      |
//!   | 500    | `dnserr`       | the provider failed to set the records                  |
//!
//! ## `/health`, `/ready` (GET)
//!
//!   Returns HTTP 200 (OK) and the body `ok` when the provider lists its zones within ten
//!   seconds, otherwise HTTP 503 (Service Unavailable) and `unhealthy: <reason>`.

mod api_error;
mod model;
mod routes;
pub mod server;

pub use server::{new, router, AppState};
