//! Port compatibility grouping.
//!
//! Ports are bucketed by a VLAN signature (forward mode, native network,
//! tagged-VLAN mode, excluded set). Within a bucket, PoE and link-speed
//! filters decide which ports can safely share a profile. The grouper
//! drives the consolidation suggestions and the trunk consistency check.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use strum::{AsRefStr, Display};

use crate::model::{
    AffectedEntity, EffectivePortConfig, ForwardMode, MacAddress, Network, Port, PortProfile,
    Severity, Switch, TaggedVlanMgmt, find_network, ids_match,
};
use crate::options::GroupingOptions;
use crate::resolve::PortResolver;
use crate::topology::Topology;

// ── Signatures ──────────────────────────────────────────────────────

/// VLAN part of a port's configuration, normalized for comparison.
///
/// Access and disabled ports carry no tagged traffic, so their excluded
/// set and tagged mode are dropped. WAN and VPN network ids never appear.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VlanSignature {
    pub forward: ForwardMode,
    pub native_network_id: Option<String>,
    pub tagged_vlan_mgmt: Option<TaggedVlanMgmt>,
    pub excluded_network_ids: BTreeSet<String>,
}

/// Link speed requirement of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedClass {
    Autoneg,
    Forced(u32),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SuggestionKind {
    /// A profile already in use fits more ports.
    ExtendUsage,
    /// An existing, unused profile fits a group of ports.
    ApplyExisting,
    /// No profile fits; a new one should be created.
    CreateNew,
}

/// A port reference detached from the topology borrow.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct PortRef {
    pub device_mac: MacAddress,
    pub device_name: Option<String>,
    pub port: u32,
    pub port_name: Option<String>,
}

impl PortRef {
    pub fn new(switch: &Switch, port: &Port) -> Self {
        Self {
            device_mac: switch.mac.clone(),
            device_name: switch.name.clone(),
            port: port.index,
            port_name: port.name.clone(),
        }
    }
}

impl From<&PortRef> for AffectedEntity {
    fn from(p: &PortRef) -> Self {
        AffectedEntity::Port {
            device_mac: p.device_mac.clone(),
            device_name: p.device_name.clone(),
            port: p.port,
            port_name: p.port_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsolidationSuggestion {
    pub kind: SuggestionKind,
    /// Existing profile; `None` for `CreateNew`.
    pub profile_id: Option<String>,
    /// Existing profile name, or the proposed name.
    pub profile_name: String,
    pub signature: VlanSignature,
    /// Ports that should adopt the profile.
    pub ports: Vec<PortRef>,
    /// Ports already on the profile (`ExtendUsage` only).
    pub already_using: Vec<PortRef>,
    pub poe_required: bool,
    pub speed: SpeedClass,
    /// The profile was chosen after the natural match rejected these
    /// ports on PoE or speed.
    pub alternate: bool,
    pub severity: Severity,
}

/// VLAN disagreement between the two ends of an infrastructure link.
#[derive(Debug, Clone, Serialize)]
pub struct TrunkMismatch {
    pub upstream: PortRef,
    pub downstream: PortRef,
    /// Tagged on the upstream end only.
    pub upstream_only: BTreeSet<u16>,
    /// Tagged on the downstream end only.
    pub downstream_only: BTreeSet<u16>,
    /// Native VLANs when both are known and differ.
    pub native: Option<(u16, u16)>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'t> {
    switch: &'t Switch,
    port: &'t Port,
}

impl Candidate<'_> {
    fn port_ref(&self) -> PortRef {
        PortRef::new(self.switch, self.port)
    }

    fn poe_required(&self) -> bool {
        self.port.poe.is_powering()
    }

    fn speed(&self) -> SpeedClass {
        speed_class(&self.port.effective, self.port)
    }
}

fn speed_class(effective: &EffectivePortConfig, port: &Port) -> SpeedClass {
    if effective.autoneg {
        SpeedClass::Autoneg
    } else {
        effective
            .forced_speed_mbps
            .or(port.speed_mbps)
            .map_or(SpeedClass::Autoneg, SpeedClass::Forced)
    }
}

// ── Grouper ─────────────────────────────────────────────────────────

pub struct CompatibilityGrouper<'a> {
    resolver: PortResolver<'a>,
    profiles: &'a [PortProfile],
    networks: &'a [Network],
    options: GroupingOptions,
}

impl<'a> CompatibilityGrouper<'a> {
    pub fn new(
        profiles: &'a [PortProfile],
        networks: &'a [Network],
        options: GroupingOptions,
    ) -> Self {
        Self {
            resolver: PortResolver::new(profiles, networks),
            profiles,
            networks,
            options,
        }
    }

    fn is_untrunkable(&self, network_id: &str) -> bool {
        find_network(self.networks, network_id).is_some_and(|n| !n.purpose.is_trunkable())
    }

    /// Normalized VLAN signature, or `None` when the native network is a
    /// WAN or VPN network. Disabled ports carry no traffic at all, so their
    /// native network is dropped too.
    pub fn signature(&self, effective: &EffectivePortConfig) -> Option<VlanSignature> {
        if effective.forward == ForwardMode::Disabled {
            return Some(VlanSignature {
                forward: ForwardMode::Disabled,
                native_network_id: None,
                tagged_vlan_mgmt: None,
                excluded_network_ids: BTreeSet::new(),
            });
        }
        if effective
            .native_network_id
            .as_deref()
            .is_some_and(|id| self.is_untrunkable(id))
        {
            return None;
        }
        let native_network_id = effective
            .native_network_id
            .as_deref()
            .map(|id| id.trim().to_ascii_lowercase());

        let (tagged_vlan_mgmt, excluded_network_ids) = match effective.forward {
            ForwardMode::Native | ForwardMode::Disabled | ForwardMode::All => {
                (None, BTreeSet::new())
            }
            ForwardMode::Custom => (
                Some(effective.tagged_vlan_mgmt.unwrap_or(TaggedVlanMgmt::Custom)),
                self.trunkable_ids(&effective.excluded_network_ids),
            ),
        };

        Some(VlanSignature {
            forward: effective.forward,
            native_network_id,
            tagged_vlan_mgmt,
            excluded_network_ids,
        })
    }

    fn trunkable_ids(&self, ids: &BTreeSet<String>) -> BTreeSet<String> {
        ids.iter().filter(|id| !self.is_untrunkable(id)).cloned().collect()
    }

    /// Whether `profile` keeps the VLAN behavior of ports in the
    /// `signature` group. A VLAN field the profile leaves unset matches
    /// anything; a profile that sets none of them covers no group.
    pub fn profile_covers(&self, profile: &PortProfile, signature: &VlanSignature) -> bool {
        if vlan_fields_set(profile) == 0 {
            return false;
        }
        let effective = self.resolver.resolve_profile(profile);

        if defined(profile.forward.as_deref()).is_some() && effective.forward != signature.forward {
            return false;
        }
        if signature.forward == ForwardMode::Disabled {
            return true;
        }
        if let Some(native) = defined(profile.native_network_id.as_deref()) {
            let native = native.to_ascii_lowercase();
            if signature.native_network_id.as_deref() != Some(native.as_str()) {
                return false;
            }
        }
        if signature.forward != ForwardMode::Custom {
            return true;
        }
        if profile
            .tagged_vlan_mgmt
            .is_some_and(|mode| signature.tagged_vlan_mgmt != Some(mode))
        {
            return false;
        }
        profile.excluded_network_ids.is_none()
            || self.trunkable_ids(&effective.excluded_network_ids) == signature.excluded_network_ids
    }

    /// A profile that forces PoE off cannot take a port that is powering
    /// a device. Ports without PoE hardware are always fine.
    pub fn poe_compatible(profile: &PortProfile, port: &Port) -> bool {
        !(profile.forces_poe_off() && port.poe.is_powering())
    }

    /// A forced-speed profile takes only ports currently linked at that
    /// speed. An autoneg profile takes only ports that negotiate.
    pub fn speed_compatible(profile: &PortProfile, port: &Port) -> bool {
        match profile.forced_speed() {
            Some(speed) => port.speed_mbps == Some(speed),
            None if profile.autoneg == Some(true) => port.effective.autoneg,
            None => true,
        }
    }

    pub fn compatible(profile: &PortProfile, port: &Port) -> bool {
        Self::poe_compatible(profile, port) && Self::speed_compatible(profile, port)
    }

    fn candidates<'t>(&self, topology: &'t Topology) -> Vec<Candidate<'t>> {
        topology
            .switches
            .iter()
            .flat_map(|switch| {
                let uplink = switch.uplink_port();
                switch
                    .manageable_ports()
                    .filter(move |p| !p.is_lag_child && !p.is_uplink && Some(p.index) != uplink)
                    .map(move |port| Candidate { switch, port })
            })
            .collect()
    }

    fn groups<'t>(&self, topology: &'t Topology) -> BTreeMap<VlanSignature, Vec<Candidate<'t>>> {
        let mut groups: BTreeMap<VlanSignature, Vec<Candidate<'t>>> = BTreeMap::new();
        for candidate in self.candidates(topology) {
            if let Some(sig) = self.signature(&candidate.port.effective) {
                groups.entry(sig).or_default().push(candidate);
            }
        }
        groups
    }

    /// Consolidation suggestions, one batch per VLAN-signature group.
    pub fn suggestions(&self, topology: &Topology) -> Vec<ConsolidationSuggestion> {
        let mut out = Vec::new();
        for (signature, members) in self.groups(topology) {
            if members.len() < self.options.min_group_size {
                continue;
            }
            let profiles = self.covering_profiles(&signature);
            self.suggest_for_group(&signature, &members, &profiles, &mut out);
        }
        tracing::debug!(suggestions = out.len(), "consolidation analysis complete");
        out
    }

    /// Profiles covering `signature`, most specific first, then by name.
    fn covering_profiles(&self, signature: &VlanSignature) -> Vec<&'a PortProfile> {
        let mut profiles: Vec<&PortProfile> = self
            .profiles
            .iter()
            .filter(|p| self.profile_covers(p, signature))
            .collect();
        profiles.sort_by_cached_key(|p| (Reverse(vlan_fields_set(p)), p.name.to_lowercase()));
        profiles
    }

    fn suggest_for_group(
        &self,
        signature: &VlanSignature,
        members: &[Candidate<'_>],
        profiles: &[&PortProfile],
        out: &mut Vec<ConsolidationSuggestion>,
    ) {
        // Set once a profile in use or already suggested turned ports away
        // on PoE or speed.
        let mut rejected = false;
        let mut pool: Vec<Candidate<'_>> = members
            .iter()
            .filter(|c| c.port.effective.profile_id.is_none())
            .copied()
            .collect();

        // ExtendUsage: a covering profile is already used in this group.
        for profile in profiles {
            let users: Vec<PortRef> = members
                .iter()
                .filter(|c| {
                    c.port
                        .effective
                        .profile_id
                        .as_deref()
                        .is_some_and(|id| ids_match(id, &profile.id))
                })
                .map(Candidate::port_ref)
                .collect();
            if users.is_empty() {
                continue;
            }
            let (fit, rest): (Vec<_>, Vec<_>) =
                pool.into_iter().partition(|c| Self::compatible(profile, c.port));
            pool = rest;
            rejected |= !pool.is_empty();
            if fit.is_empty() {
                continue;
            }
            out.push(self.existing(
                SuggestionKind::ExtendUsage,
                profile,
                signature,
                &fit,
                users,
                false,
            ));
        }

        // ApplyExisting: unused covering profiles, natural match first,
        // then alternates for the ports it rejected.
        for profile in profiles {
            if pool.len() < self.options.min_group_size {
                break;
            }
            let (fit, rest): (Vec<_>, Vec<_>) =
                pool.iter().copied().partition(|c| Self::compatible(profile, c.port));
            if fit.len() >= self.options.min_group_size {
                out.push(self.existing(
                    SuggestionKind::ApplyExisting,
                    profile,
                    signature,
                    &fit,
                    Vec::new(),
                    rejected,
                ));
                pool = rest;
                rejected |= !pool.is_empty();
            }
        }

        // CreateNew: whatever no profile covers, split by PoE and speed.
        let mut buckets: BTreeMap<(bool, SpeedClass), Vec<Candidate<'_>>> = BTreeMap::new();
        for c in pool {
            buckets.entry((c.poe_required(), c.speed())).or_default().push(c);
        }
        for ((poe_required, speed), bucket) in buckets {
            if bucket.len() < self.options.min_group_size {
                continue;
            }
            let severity = if bucket.len() >= self.options.create_new_escalation {
                Severity::Recommended
            } else {
                Severity::Informational
            };
            out.push(ConsolidationSuggestion {
                kind: SuggestionKind::CreateNew,
                profile_id: None,
                profile_name: self.suggested_name(signature, poe_required, speed),
                signature: signature.clone(),
                ports: bucket.iter().map(Candidate::port_ref).collect(),
                already_using: Vec::new(),
                poe_required,
                speed,
                alternate: false,
                severity,
            });
        }
    }

    /// Suggestion against an existing profile. `ApplyExisting` escalates on
    /// the same threshold as `ExtendUsage`, since both only attach ports to
    /// a profile that already exists.
    fn existing(
        &self,
        kind: SuggestionKind,
        profile: &PortProfile,
        signature: &VlanSignature,
        fit: &[Candidate<'_>],
        already_using: Vec<PortRef>,
        alternate: bool,
    ) -> ConsolidationSuggestion {
        let severity = if fit.len() >= self.options.extend_usage_escalation {
            Severity::Recommended
        } else {
            Severity::Informational
        };
        ConsolidationSuggestion {
            kind,
            profile_id: Some(profile.id.clone()),
            profile_name: profile.name.clone(),
            signature: signature.clone(),
            ports: fit.iter().map(Candidate::port_ref).collect(),
            already_using,
            poe_required: fit.iter().any(Candidate::poe_required),
            speed: profile
                .forced_speed()
                .map_or(SpeedClass::Autoneg, SpeedClass::Forced),
            alternate,
            severity,
        }
    }

    fn suggested_name(&self, signature: &VlanSignature, poe: bool, speed: SpeedClass) -> String {
        let native = signature
            .native_network_id
            .as_deref()
            .and_then(|id| find_network(self.networks, id))
            .map_or_else(|| "Untagged".to_owned(), |n| n.name.clone());

        let mut name = match signature.forward {
            ForwardMode::Native => format!("{native} Access"),
            ForwardMode::Custom => format!("{native} Trunk"),
            ForwardMode::All => format!("{native} Trunk (All)"),
            ForwardMode::Disabled => "Disabled".to_owned(),
        };
        if poe {
            name.push_str(" (PoE)");
        }
        if let SpeedClass::Forced(mbps) = speed {
            name.push_str(&format!(" ({mbps} Mbps)"));
        }
        name
    }
}

fn defined(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Number of VLAN fields a profile sets, used to rank covering profiles.
fn vlan_fields_set(profile: &PortProfile) -> usize {
    [
        defined(profile.forward.as_deref()).is_some(),
        defined(profile.native_network_id.as_deref()).is_some(),
        profile.tagged_vlan_mgmt.is_some(),
        profile.excluded_network_ids.is_some(),
    ]
    .into_iter()
    .filter(|set| *set)
    .count()
}

// ── Trunk consistency ───────────────────────────────────────────────

/// Compare the VLAN state of both ends of every infrastructure link.
pub fn trunk_mismatches(topology: &Topology) -> Vec<TrunkMismatch> {
    topology
        .infrastructure_links()
        .into_iter()
        .filter_map(|link| {
            let up = &link.upstream_port.effective;
            let down = &link.downstream_port.effective;
            if up.is_disabled() || down.is_disabled() {
                return None;
            }
            let upstream_only: BTreeSet<u16> =
                up.tagged_vlans.difference(&down.tagged_vlans).copied().collect();
            let downstream_only: BTreeSet<u16> =
                down.tagged_vlans.difference(&up.tagged_vlans).copied().collect();
            let native = match (up.native_vlan, down.native_vlan) {
                (Some(a), Some(b)) if a != b => Some((a, b)),
                _ => None,
            };
            if upstream_only.is_empty() && downstream_only.is_empty() && native.is_none() {
                return None;
            }
            Some(TrunkMismatch {
                upstream: PortRef::new(link.upstream, link.upstream_port),
                downstream: PortRef::new(link.downstream, link.downstream_port),
                upstream_only,
                downstream_only,
                native,
            })
        })
        .collect()
}
