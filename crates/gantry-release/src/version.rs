//! Next-version calculation
//!
//! Computes the next semantic version for a module from its latest tag, its
//! release policy, and the aggregated changelog annotations. Versions carry
//! a leading `v`; build metadata on the latest tag is discarded before any
//! arithmetic. The computed version must compare strictly greater than the
//! prior version.

use semver::{BuildMetadata, Prerelease, Version};
use tracing::debug;

use gantry_changelog::{version_increment, Annotation, SemverIncrement};
use gantry_core::config::ModulePolicy;
use gantry_core::error::{Result, VersionError};

const DEFAULT_PRE_RELEASE: &str = "preview";

/// Calculate the next version for the module. The provided annotations must
/// be the ones applicable to this specific module. A `preview` identifier
/// puts the calculation into global preview mode.
pub fn calculate_next_version(
    module_path: &str,
    latest: Option<&str>,
    policy: &ModulePolicy,
    annotations: &[Annotation],
    preview: Option<&str>,
) -> Result<String> {
    let path_major = split_path_major(module_path)?;
    let increment = version_increment(annotations);

    let Some(latest) = latest.filter(|l| !l.is_empty()) else {
        let next = new_module_version(path_major, increment, policy, preview);
        debug!(module = module_path, %next, "new module version");
        return Ok(next);
    };

    let prior = parse_version(latest)?;

    let next = if let Some(identifier) = preview {
        preview_version(&prior, increment, identifier)?
    } else {
        release_version(&prior, increment, policy, latest)?
    };

    if next <= prior {
        return Err(VersionError::NotIncreasing {
            next: format!("v{next}"),
            latest: latest.to_string(),
        }
        .into());
    }

    debug!(module = module_path, from = latest, to = %next, "calculated next version");
    Ok(format!("v{next}"))
}

/// The base version for a module that has never been tagged, with its
/// pre-release identifier applied unless a release promotion was annotated.
fn new_module_version(
    path_major: Option<u64>,
    increment: SemverIncrement,
    policy: &ModulePolicy,
    preview: Option<&str>,
) -> String {
    let base = format!("v{}.0.0", path_major.unwrap_or(1));

    // By default new modules get a pre-release tag, unless a change
    // annotation marks the module for release.
    if increment == SemverIncrement::Release && preview.is_none() {
        return base;
    }

    let identifier = preview
        .or_else(|| policy.pre_release_track())
        .unwrap_or(DEFAULT_PRE_RELEASE);
    format!("{base}-{identifier}")
}

/// Global preview mode: the requested identifier replaces any existing
/// pre-release tag; otherwise the numeric part is bumped first and the
/// identifier attached.
fn preview_version(prior: &Version, increment: SemverIncrement, identifier: &str) -> Result<Version> {
    let mut next = prior.clone();

    if increment == SemverIncrement::Release || !prior.pre.is_empty() {
        // v1.4.0-preview => v1.4.0-foo
        next.pre = pre_release(identifier)?;
        return Ok(next);
    }

    match increment {
        SemverIncrement::Minor => {
            // v1.2.3 => v1.3.0-foo
            next.minor += 1;
            next.patch = 0;
        }
        _ => {
            // v1.2.3 => v1.2.4-foo
            next.patch += 1;
        }
    }
    next.pre = pre_release(identifier)?;
    Ok(next)
}

fn release_version(
    prior: &Version,
    increment: SemverIncrement,
    policy: &ModulePolicy,
    latest: &str,
) -> Result<Version> {
    let mut next = prior.clone();

    if increment == SemverIncrement::Release {
        // Release bumps elevate a pre-release to a released version:
        //   v1.4.0-preview.1 => v1.4.0
        if prior.pre.is_empty() {
            return Err(VersionError::NotAPreRelease(latest.to_string()).into());
        }
        next.pre = Prerelease::EMPTY;
    } else if !prior.pre.is_empty() {
        // The latest tag is a pre-release; increment its numeric suffix, or
        // switch tracks if a different identifier is configured:
        //   v1.4.0-preview.2 => v1.4.0-preview.3
        //   v1.4.0-preview   => v1.4.0-rc (configured identifier "rc")
        increment_pre_release(&mut next, policy.pre_release_track())?;
    } else if let Some(track) = policy.pre_release_track() {
        // The latest tag was not a pre-release but the module is configured
        // for one; start a new preview cycle off a patch bump regardless of
        // the annotated bump size.
        next.patch += 1;
        next.pre = pre_release(track)?;
    } else if increment == SemverIncrement::Minor {
        next.minor += 1;
        next.patch = 0;
    } else {
        next.patch += 1;
    }

    Ok(next)
}

/// Increment the trailing numeric component of the pre-release tag, starting
/// a `.1` suffix if none exists. A configured identifier that the current
/// tag does not carry switches the track instead.
fn increment_pre_release(version: &mut Version, configured: Option<&str>) -> Result<()> {
    let current = version.pre.as_str().to_string();

    if let Some(track) = configured {
        if !current.starts_with(track) {
            version.pre = pre_release(track)?;
            return Ok(());
        }
    }

    let next = match current.rsplit_once('.') {
        Some((prefix, number)) => {
            let n: u64 = number
                .parse()
                .map_err(|_| VersionError::InvalidPreRelease(current.clone()))?;
            format!("{prefix}.{}", n + 1)
        }
        None => format!("{current}.1"),
    };

    version.pre = pre_release(&next)?;
    Ok(())
}

fn pre_release(identifier: &str) -> Result<Prerelease> {
    Prerelease::new(identifier)
        .map_err(|_| VersionError::InvalidPreRelease(identifier.to_string()).into())
}

/// Parse a `v`-prefixed semantic version, discarding build metadata.
pub fn parse_version(version: &str) -> Result<Version> {
    let stripped = version.strip_prefix('v').ok_or_else(|| VersionError::ParseFailed {
        version: version.to_string(),
        reason: "missing leading 'v'".to_string(),
    })?;

    let mut parsed = Version::parse(stripped).map_err(|e| VersionError::ParseFailed {
        version: version.to_string(),
        reason: e.to_string(),
    })?;
    parsed.build = BuildMetadata::EMPTY;
    Ok(parsed)
}

/// The major version a module path's trailing `/vN` element pins, if any. A
/// `/v0` or `/v1` element is an invalid module path.
pub fn split_path_major(module_path: &str) -> Result<Option<u64>> {
    let last = match module_path.rsplit_once('/') {
        Some((_, last)) => last,
        None => return Ok(None),
    };

    let Some(digits) = last.strip_prefix('v') else {
        return Ok(None);
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }

    let major: u64 = digits
        .parse()
        .map_err(|_| VersionError::InvalidModulePath(module_path.to_string()))?;
    if major < 2 {
        return Err(VersionError::InvalidModulePath(module_path.to_string()).into());
    }
    Ok(Some(major))
}
