//! Firmware detection from `show version` output.

use log::debug;

use super::FirmwareKind;
use crate::error::{FirmwareError, Result};
use crate::session::Session;
use crate::transport::Channel;

/// Number of leading `show version` lines inspected for firmware keywords.
const DETECTION_WINDOW: usize = 10;

/// Identify the firmware family by tallying telltale keywords in the first
/// lines of `show version`. Pagination is disabled first so the banner is
/// not cut short by a `--More--` pause.
pub async fn detect_firmware<C: Channel>(session: &mut Session<C>) -> Result<FirmwareKind> {
    session.set_terminal_length(0).await?;
    let show_version = session.send_command_get_output("show version").await?;
    classify_show_version(&show_version)
}

/// Tally keyword hits over the detection window; the highest count wins,
/// earlier variants winning ties. Zero evidence is a detection failure
/// rather than an arbitrary guess.
pub(crate) fn classify_show_version(lines: &[String]) -> Result<FirmwareKind> {
    let mut iosxe = 0u32;
    let mut ios = 0u32;
    let mut nxos = 0u32;
    let mut asa = 0u32;

    for line in lines.iter().take(DETECTION_WINDOW) {
        let line = line.to_lowercase();
        if line.contains("ios-xe") || line.contains("ios xe") {
            iosxe += 1;
        } else if line.contains("ios") {
            ios += 1;
        } else if line.contains("nx-os") {
            nxos += 1;
        } else if line.contains("adaptive security appliance") {
            asa += 1;
        }
    }

    let tallies = [
        (FirmwareKind::IosXe, iosxe),
        (FirmwareKind::Ios, ios),
        (FirmwareKind::Nxos, nxos),
        (FirmwareKind::Asa, asa),
    ];
    let (kind, count) = tallies
        .into_iter()
        .fold((FirmwareKind::IosXe, 0), |best, candidate| {
            if candidate.1 > best.1 { candidate } else { best }
        });

    if count == 0 {
        return Err(FirmwareError::DetectionFailed.into());
    }

    debug!("detected firmware {kind} ({count} keyword hits)");
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_detects_ios() {
        let output = lines(&[
            "Cisco IOS Software, C2960X Software (C2960X-UNIVERSALK9-M), Version 15.2(7)E3",
            "Technical Support: http://www.cisco.com/techsupport",
            "Copyright (c) 1986-2020 by Cisco Systems, Inc.",
        ]);
        assert_eq!(classify_show_version(&output).unwrap(), FirmwareKind::Ios);
    }

    #[test]
    fn test_detects_iosxe_over_ios() {
        // IOS-XE banners mention plain "IOS" too; the XE keyword is matched
        // first per line so XE outscores it.
        let output = lines(&[
            "Cisco IOS XE Software, Version 17.03.04a",
            "Cisco IOS Software [Amsterdam], Catalyst L3 Switch Software, Version 17.3.4a",
            "Copyright (c) 1986-2021 by Cisco Systems, Inc.",
        ]);
        assert_eq!(classify_show_version(&output).unwrap(), FirmwareKind::IosXe);
    }

    #[test]
    fn test_detects_nxos() {
        let output = lines(&[
            "Cisco Nexus Operating System (NX-OS) Software",
            "TAC support: http://www.cisco.com/tac",
            "NX-OS image file is: bootflash:///nxos.9.3.8.bin",
        ]);
        assert_eq!(classify_show_version(&output).unwrap(), FirmwareKind::Nxos);
    }

    #[test]
    fn test_detects_asa() {
        let output = lines(&[
            "Cisco Adaptive Security Appliance Software Version 9.14(2)",
            "Firepower Extensible Operating System Version 2.8(1.143)",
        ]);
        assert_eq!(classify_show_version(&output).unwrap(), FirmwareKind::Asa);
    }

    #[test]
    fn test_zero_evidence_is_a_failure() {
        let output = lines(&["% Invalid input detected at '^' marker.", "switch01#"]);
        let err = classify_show_version(&output).unwrap_err();
        assert!(matches!(
            err,
            Error::Firmware(FirmwareError::DetectionFailed)
        ));
    }

    #[test]
    fn test_only_leading_lines_are_inspected() {
        let mut text: Vec<String> = (0..DETECTION_WINDOW).map(|i| format!("line {i}")).collect();
        text.push("Cisco IOS Software".to_string());
        let err = classify_show_version(&text).unwrap_err();
        assert!(matches!(
            err,
            Error::Firmware(FirmwareError::DetectionFailed)
        ));
    }
}
