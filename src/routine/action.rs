//! Parsing of free-text step actions into typed commands.

use serde::Serialize;
use std::time::Duration;

use super::types::{RoutineStep, StepType};
use crate::devices::lights::LightCommand;

/// Brightness applied by the `Dim` light action.
pub const DIM_BRIGHTNESS: u8 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MusicCommand {
    Play,
    Pause,
    Next,
    Previous,
    Volume { level: u8 },
    Playlist { id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum TvCommand {
    PowerOn,
    PowerOff,
    Home,
    Launch { app: String },
    VolumeUp,
    VolumeDown,
    Mute,
    Up,
    Down,
    Left,
    Right,
    Select,
    Back,
}

/// A step resolved into something that can be executed.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Light(LightCommand),
    Music(MusicCommand),
    Tv(TvCommand),
    Speak(String),
    Wait(Duration),
}

impl Action {
    pub fn step_type(&self) -> StepType {
        match self {
            Self::Light(_) => StepType::LightControl,
            Self::Music(_) => StepType::MusicControl,
            Self::Tv(_) => StepType::TvControl,
            Self::Speak(_) => StepType::VoiceCommand,
            Self::Wait(_) => StepType::Wait,
        }
    }
}

/// Resolve a routine step into an [`Action`].
pub fn parse_step(step: &RoutineStep) -> Result<Action, String> {
    if step.step_type == StepType::Wait {
        return parse_wait(step).map(Action::Wait);
    }

    let text = step.action.as_text();
    let text = text.trim();
    if text.is_empty() {
        return Err(format!("{} step has an empty action", step.step_type));
    }

    match step.step_type {
        StepType::LightControl => parse_light(text).map(Action::Light),
        StepType::MusicControl => parse_music(text).map(Action::Music),
        StepType::TvControl => parse_tv(text).map(Action::Tv),
        StepType::VoiceCommand => Ok(Action::Speak(text.to_string())),
        StepType::Wait => parse_wait(step).map(Action::Wait),
    }
}

fn parse_wait(step: &RoutineStep) -> Result<Duration, String> {
    let secs = step
        .action
        .as_seconds()
        .ok_or_else(|| format!("wait duration is not a number: {}", step.action.as_text()))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("wait duration must be a non-negative number, got {secs}"))
}

/// Split `"Verb: argument"` into a normalized verb and a trimmed argument.
fn split_action(text: &str) -> (String, Option<&str>) {
    match text.split_once(':') {
        Some((verb, arg)) => (normalize(verb), Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (normalize(text), None),
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_percent(arg: Option<&str>, what: &str) -> Result<u8, String> {
    let raw = arg.ok_or_else(|| format!("{what} requires a value"))?;
    let value: u32 = raw
        .trim_end_matches('%')
        .trim()
        .parse()
        .map_err(|_| format!("{what} must be a whole number, got {raw:?}"))?;
    if value > 100 {
        return Err(format!("{what} must be between 0 and 100, got {value}"));
    }
    Ok(value as u8)
}

fn parse_light(text: &str) -> Result<LightCommand, String> {
    let (verb, arg) = split_action(text);
    match verb.as_str() {
        "turn on" | "on" | "turn on all lights" => Ok(LightCommand::TurnOn),
        "turn off" | "off" | "turn off all lights" => Ok(LightCommand::TurnOff),
        "set color" | "color" => arg
            .map(|c| LightCommand::SetColor {
                color: c.to_string(),
            })
            .ok_or_else(|| "set color requires a color".to_string()),
        "set brightness" | "brightness" => Ok(LightCommand::SetBrightness {
            level: parse_percent(arg, "brightness")?,
        }),
        "dim" | "dim lights" => Ok(LightCommand::SetBrightness {
            level: DIM_BRIGHTNESS,
        }),
        _ => Err(format!("unknown light action: {text}")),
    }
}

fn parse_music(text: &str) -> Result<MusicCommand, String> {
    let (verb, arg) = split_action(text);
    match verb.as_str() {
        "play" | "play music" => Ok(MusicCommand::Play),
        "pause" | "pause music" => Ok(MusicCommand::Pause),
        "next" | "next track" | "skip" => Ok(MusicCommand::Next),
        "previous" | "previous track" => Ok(MusicCommand::Previous),
        "volume" | "set volume" => Ok(MusicCommand::Volume {
            level: parse_percent(arg, "volume")?,
        }),
        "playlist" | "play playlist" => arg
            .map(|id| MusicCommand::Playlist { id: id.to_string() })
            .ok_or_else(|| "playlist requires an id".to_string()),
        _ => Err(format!("unknown music action: {text}")),
    }
}

fn parse_tv(text: &str) -> Result<TvCommand, String> {
    let (verb, arg) = split_action(text);
    let command = match verb.as_str() {
        "power on" | "turn on tv" => TvCommand::PowerOn,
        "power off" | "turn off tv" => TvCommand::PowerOff,
        "home" => TvCommand::Home,
        "launch" | "launch app" => {
            let app = arg.ok_or_else(|| "launch requires an app name".to_string())?;
            TvCommand::Launch {
                app: app.to_string(),
            }
        }
        "volume up" => TvCommand::VolumeUp,
        "volume down" => TvCommand::VolumeDown,
        "mute" => TvCommand::Mute,
        "up" => TvCommand::Up,
        "down" => TvCommand::Down,
        "left" => TvCommand::Left,
        "right" => TvCommand::Right,
        "select" | "ok" => TvCommand::Select,
        "back" => TvCommand::Back,
        other if other.starts_with("launch ") => {
            let app = text
                .split_once(char::is_whitespace)
                .map(|(_, rest)| rest.trim())
                .unwrap_or_default();
            TvCommand::Launch {
                app: app.to_string(),
            }
        }
        _ => return Err(format!("unknown TV action: {text}")),
    };
    Ok(command)
}
