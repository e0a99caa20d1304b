//! Differential reconciliation
//!
//! Turns the published state of one device into another by issuing the
//! minimal set of signed mutations, in three serial sub-steps:
//!
//! 1. reverse addresses (PTR `address -> device`)
//! 2. aliases (CNAME `alias -> device`)
//! 3. secondary mappings (PTR `address -> alias`)
//!
//! Each sub-step removes what `from` has and `to` lacks, then inserts what
//! `to` has and `from` lacks. Removals delete only the record `from`
//! published, so a pointer an earlier sub-step wrote for the same address
//! survives. Every insertion is preceded by a removal of the same RRset so
//! that re-running against a partially applied state is safe.
//!
//! ## Private Zone Routing
//!
//! Pointer records live in reverse zones. Addresses in the private ranges
//! are routed to their own reverse zone:
//!
//! | Range           | Zone                     |
//! |-----------------|--------------------------|
//! | 10.0.0.0/8      | `10.in-addr.arpa.`       |
//! | 172.16.0.0/12   | `<b>.172.in-addr.arpa.`  |
//! | 192.168.0.0/16  | `168.192.in-addr.arpa.`  |
//!
//! Anything else routes to the caller's zone, and a pointer change routed to
//! the caller's zone is skipped so the forward zone is never edited as if it
//! were a reverse zone.
//!
//! A failure in any step aborts the remaining ones. Nothing is retried.

use crate::device::Device;
use crate::directory::DirectoryService;
use crate::error::Result;
use crate::record::{Record, fqdn, names_equal, reverse_name};
use serde::Serialize;
use std::net::IpAddr;
use tracing::{debug, info};

/// Reverse zone governing an address, or `zone` outside the private ranges
pub fn private_zone(ip: IpAddr, zone: &str) -> String {
    match ip {
        IpAddr::V4(v4) => match v4.octets() {
            [10, ..] => "10.in-addr.arpa.".to_string(),
            [172, b, ..] if (16..32).contains(&b) => format!("{}.172.in-addr.arpa.", b),
            [192, 168, ..] => "168.192.in-addr.arpa.".to_string(),
            _ => fqdn(zone),
        },
        IpAddr::V6(_) => fqdn(zone),
    }
}

/// Mutations issued by one reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub reverse_removed: usize,
    pub reverse_inserted: usize,
    pub aliases_removed: usize,
    pub aliases_inserted: usize,
    pub mappings_removed: usize,
    pub mappings_inserted: usize,
    /// Pointer changes routed to the caller's zone and therefore not applied
    pub skipped: usize,
}

impl ReconcileReport {
    /// Number of removals and insertions applied
    pub fn mutations(&self) -> usize {
        self.reverse_removed
            + self.reverse_inserted
            + self.aliases_removed
            + self.aliases_inserted
            + self.mappings_removed
            + self.mappings_inserted
    }

    /// No mutation was issued
    pub fn is_empty(&self) -> bool {
        self.mutations() == 0
    }
}

/// Applies device differences to the directory
#[derive(Debug)]
pub struct Reconciler<'a> {
    directory: &'a DirectoryService,
}

impl<'a> Reconciler<'a> {
    pub fn new(directory: &'a DirectoryService) -> Self {
        Self { directory }
    }

    /// Transform the published state of `from` into that of `to`
    ///
    /// `zone` is the forward zone aliases are published in; `ttl` is stamped
    /// on every inserted record.
    pub async fn reconcile(
        &self,
        zone: &str,
        ttl: u32,
        from: &Device,
        to: &Device,
    ) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        self.reconcile_reverse(zone, ttl, from, to, &mut report).await?;
        self.reconcile_aliases(zone, ttl, from, to, &mut report).await?;
        self.reconcile_mappings(zone, ttl, from, to, &mut report).await?;

        debug!("Reconciled {}: {:?}", to.name, report);
        Ok(report)
    }

    async fn reconcile_reverse(
        &self,
        zone: &str,
        ttl: u32,
        from: &Device,
        to: &Device,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        for ip in from.reverse.iter().filter(|ip| !to.has_reverse(**ip)) {
            info!("Extra reverse {} for {}", ip, from.name);
            if self.remove_pointer(zone, *ip, &from.name).await? {
                report.reverse_removed += 1;
            } else {
                report.skipped += 1;
            }
        }

        for ip in to.reverse.iter().filter(|ip| !from.has_reverse(**ip)) {
            info!("Missing reverse {} for {}", ip, to.name);
            if self.insert_pointer(zone, ttl, *ip, &to.name).await? {
                report.reverse_inserted += 1;
            } else {
                report.skipped += 1;
            }
        }

        Ok(())
    }

    async fn reconcile_aliases(
        &self,
        zone: &str,
        ttl: u32,
        from: &Device,
        to: &Device,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        for alias in from.aliases.iter().filter(|a| !to.has_alias(a)) {
            info!("Extra alias {} for {}", alias, from.name);
            self.directory
                .remove(zone, vec![Record::alias(alias, &from.name)])
                .await?;
            report.aliases_removed += 1;
        }

        for alias in to.aliases.iter().filter(|a| !from.has_alias(a)) {
            info!("Missing alias {} for {}", alias, to.name);
            let record = Record::alias(alias, &to.name).with_ttl(ttl);
            self.directory.remove_rrset(zone, vec![record.clone()]).await?;
            self.directory.insert(zone, vec![record]).await?;
            report.aliases_inserted += 1;
        }

        Ok(())
    }

    async fn reconcile_mappings(
        &self,
        zone: &str,
        ttl: u32,
        from: &Device,
        to: &Device,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        for (name, ip) in from.mapping.iter().filter(|(n, ip)| !to.has_mapping(n, **ip)) {
            info!("Extra mapping {} -> {} for {}", name, ip, from.name);
            if self.remove_pointer(zone, *ip, name).await? {
                report.mappings_removed += 1;
            } else {
                report.skipped += 1;
            }
        }

        for (name, ip) in to.mapping.iter().filter(|(n, ip)| !from.has_mapping(n, **ip)) {
            info!("Missing mapping {} -> {} for {}", name, ip, to.name);
            if self.insert_pointer(zone, ttl, *ip, name).await? {
                report.mappings_inserted += 1;
            } else {
                report.skipped += 1;
            }
        }

        Ok(())
    }

    /// Remove the pointer `ip -> target`; returns false when the routing guard skipped it
    async fn remove_pointer(&self, zone: &str, ip: IpAddr, target: &str) -> Result<bool> {
        let reverse_zone = private_zone(ip, zone);
        if names_equal(&reverse_zone, zone) {
            debug!("Not removing pointer for {}: routed to {}", ip, zone);
            return Ok(false);
        }

        let record = Record::pointer(reverse_name(ip), target);
        self.directory.remove(&reverse_zone, vec![record]).await?;
        Ok(true)
    }

    /// Replace the pointer for `ip`; returns false when the routing guard skipped it
    async fn insert_pointer(&self, zone: &str, ttl: u32, ip: IpAddr, target: &str) -> Result<bool> {
        let reverse_zone = private_zone(ip, zone);
        if names_equal(&reverse_zone, zone) {
            debug!("Not inserting pointer for {}: routed to {}", ip, zone);
            return Ok(false);
        }

        let record = Record::pointer(reverse_name(ip), target).with_ttl(ttl);
        self.directory.remove_rrset(&reverse_zone, vec![record.clone()]).await?;
        self.directory.insert(&reverse_zone, vec![record]).await?;
        Ok(true)
    }
}
