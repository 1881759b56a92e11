//! Start-up checks and plane selection for one invocation.

use crate::apply::{self, Planes};
use crate::backend::{ConfigSource, FirewallBackend};
use crate::error::{BackendError, Result};
use crate::model::RuleKind;
use crate::plane::{PermanentPlane, PlaneAccessor, RuntimePlane};
use crate::reconcile::Coverage;
use crate::settings::ZoneSettings;
use crate::types::{ActivePlanes, DesiredState, Plane, PlaneFlags, ReconciliationResult};

/// Minimum backend version for operation through the running service.
pub const MIN_CONNECTED_VERSION: &str = "0.2.11";
/// Minimum backend version for offline operation.
pub const MIN_OFFLINE_VERSION: &str = "0.3.9";

/// How the backend is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The service is running; both planes are reachable.
    Connected,
    /// The service is stopped; only persisted configuration is reachable.
    Offline,
}

/// A probed backend with its effective planes and zone.
pub struct Session {
    backend: Box<dyn FirewallBackend>,
    mode: Mode,
    planes: ActivePlanes,
    zone: String,
    version: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("planes", &self.planes)
            .field("zone", &self.zone)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Probe the backend and settle which planes and zone to use.
    ///
    /// A stopped service falls back to offline mode only when `flags` allow
    /// it. Offline mode overrides the requested planes: runtime off,
    /// permanent on.
    pub fn open(
        backend: Box<dyn FirewallBackend>,
        flags: PlaneFlags,
        zone: Option<&str>,
    ) -> Result<Self> {
        let (mode, planes) = if backend.is_running()? {
            (Mode::Connected, flags.resolve())
        } else if flags.offline_allowed() {
            log::info!(
                "firewalld is not running, using offline mode: runtime plane disabled, permanent plane enabled"
            );
            (
                Mode::Offline,
                ActivePlanes {
                    runtime: false,
                    permanent: true,
                },
            )
        } else {
            return Err(BackendError::OfflineDeclined.into());
        };

        let source = source_for(mode);
        let (required, label) = match mode {
            Mode::Connected => (MIN_CONNECTED_VERSION, "connected"),
            Mode::Offline => (MIN_OFFLINE_VERSION, "offline"),
        };
        let version = backend.version(source)?;
        if !version_at_least(&version, required) {
            return Err(BackendError::UnsupportedVersion {
                version,
                required: required.to_string(),
                mode: label,
            }
            .into());
        }

        let zone = match zone {
            Some(zone) => {
                if planes.runtime && mode == Mode::Connected {
                    ensure_zone(&backend.runtime_zones()?, zone, Plane::Runtime)?;
                }
                if planes.permanent {
                    ensure_zone(&backend.permanent_zones(source)?, zone, Plane::Permanent)?;
                }
                zone.to_string()
            }
            None => backend.default_zone(source)?,
        };

        log::debug!("session: {mode:?}, version {version}, zone {zone}, planes {planes:?}");
        Ok(Self {
            backend,
            mode,
            planes,
            zone,
            version,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Planes after the offline override, if any.
    pub fn planes(&self) -> ActivePlanes {
        self.planes
    }

    /// The zone every action of this session targets.
    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Where persisted configuration is read from.
    pub fn source(&self) -> ConfigSource {
        source_for(self.mode)
    }

    /// Persisted settings of the session zone.
    pub fn snapshot(&self) -> Result<ZoneSettings> {
        self.backend.load_settings(&self.zone, self.source())
    }

    /// Reconcile `desired` against this session's planes.
    pub fn reconcile(&self, desired: &DesiredState, dry_run: bool) -> Result<ReconciliationResult> {
        let backend = self.backend.as_ref();
        let sources = desired.count(RuleKind::Source) > 0;

        let runtime_coverage = match (self.mode, self.planes.runtime) {
            (Mode::Connected, true) => Some(Coverage::All),
            (Mode::Connected, false) if sources => {
                log::warn!("runtime plane not selected, runtime source entries are still reconciled");
                Some(Coverage::SourcesOnly)
            }
            (Mode::Offline, _) if sources => {
                log::warn!("no runtime plane in offline mode, runtime source entries are skipped");
                None
            }
            _ => None,
        };

        let mut runtime = runtime_coverage.map(|coverage| (RuntimePlane::new(backend), coverage));
        let mut permanent = self
            .planes
            .permanent
            .then(|| PermanentPlane::new(backend, self.source()));

        let planes = Planes {
            runtime: runtime
                .as_mut()
                .map(|(plane, coverage)| (plane as &mut dyn PlaneAccessor, *coverage)),
            permanent: permanent.as_mut().map(|plane| plane as &mut dyn PlaneAccessor),
        };
        apply::run(desired, &self.zone, planes, dry_run)
    }
}

fn source_for(mode: Mode) -> ConfigSource {
    match mode {
        Mode::Connected => ConfigSource::Daemon,
        Mode::Offline => ConfigSource::Offline,
    }
}

fn ensure_zone(zones: &[String], zone: &str, plane: Plane) -> Result<()> {
    if zones.iter().any(|z| z == zone) {
        Ok(())
    } else {
        Err(BackendError::UnknownZone {
            zone: zone.to_string(),
            plane,
        }
        .into())
    }
}

/// Compare dotted version strings numerically; non-numeric suffixes are
/// ignored, so `1.0.0-rc1` counts as `1.0.0`.
pub fn version_at_least(version: &str, minimum: &str) -> bool {
    fn parts(v: &str) -> Vec<u64> {
        v.trim()
            .split('.')
            .map(|part| {
                let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
                digits.parse().unwrap_or(0)
            })
            .collect()
    }

    let (mut have, mut need) = (parts(version), parts(minimum));
    let len = have.len().max(need.len());
    have.resize(len, 0);
    need.resize(len, 0);
    have >= need
}
