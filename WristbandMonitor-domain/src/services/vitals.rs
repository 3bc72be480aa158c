use crate::entities::reading::Reading;
use crate::entities::vitals::{BloodPressureEstimate, DeviceCard, VitalStatus};

/// Round half toward positive infinity
fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// Estimate blood pressure from heart rate and SpO2.
///
/// Fixed linear model; results are not clamped and may leave the
/// physiological range for extreme inputs.
pub fn estimate_blood_pressure(hr: i32, spo2: i32) -> BloodPressureEstimate {
    let hr_delta = (hr as f64) - 60.0;
    let spo2_deficit = 100.0 - (spo2 as f64);

    BloodPressureEstimate {
        systolic: round_half_up(90.0 + hr_delta * 0.8 + spo2_deficit * 1.2),
        diastolic: round_half_up(60.0 + hr_delta * 0.4 + spo2_deficit * 0.8),
    }
}

/// Classify a heart rate in BPM
pub fn classify_heart_rate(hr: i32) -> VitalStatus {
    if !(60..=100).contains(&hr) {
        VitalStatus::Critical
    } else if !(70..=90).contains(&hr) {
        VitalStatus::Warning
    } else {
        VitalStatus::Normal
    }
}

/// Classify a temperature in degrees Celsius
pub fn classify_temperature(temp: f64) -> VitalStatus {
    if temp < 36.0 || temp > 37.5 {
        VitalStatus::Critical
    } else if temp < 36.5 || temp > 37.2 {
        VitalStatus::Warning
    } else {
        VitalStatus::Normal
    }
}

/// Classify a blood oxygen saturation in percent
pub fn classify_spo2(spo2: i32) -> VitalStatus {
    if spo2 < 95 {
        VitalStatus::Critical
    } else if spo2 < 97 {
        VitalStatus::Warning
    } else {
        VitalStatus::Normal
    }
}

/// Classify a systolic/diastolic pair in mmHg
pub fn classify_blood_pressure(systolic: i32, diastolic: i32) -> VitalStatus {
    if systolic > 140 || systolic < 90 || diastolic > 90 || diastolic < 60 {
        VitalStatus::Critical
    } else if systolic > 130 || systolic < 100 || diastolic > 85 || diastolic < 65 {
        VitalStatus::Warning
    } else {
        VitalStatus::Normal
    }
}

/// Live-view card for the latest reading of a device
pub fn device_card(latest: Reading) -> DeviceCard {
    DeviceCard {
        device_id: latest.device_id.clone(),
        hr_status: classify_heart_rate(latest.hr),
        temp_status: classify_temperature(latest.temp),
        spo2_status: classify_spo2(latest.spo2),
        bp_status: classify_blood_pressure(latest.bp_sys, latest.bp_dia),
        latest,
    }
}
