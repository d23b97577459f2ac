//! Locale copy for the practice flow.
//!
//! The core surfaces status signals, not strings; this module maps each
//! signal to the user-facing text for a locale. Lookups are total: every
//! status has text in every locale.

use crate::recorder::RecorderStatus;

/// Locales the practice flow ships in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locale {
    Zh,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Zh, Locale::En];

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Zh => "zh",
            Locale::En => "en",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recorder button labels.
#[derive(Debug, Clone, Copy)]
pub struct RecorderButtons {
    pub start: &'static str,
    pub stop: &'static str,
    pub download: &'static str,
}

struct LocaleCopy {
    recorder_idle: &'static str,
    recorder_recording: &'static str,
    recorder_processing: &'static str,
    recorder_ready: &'static str,
    recorder_permission: &'static str,
    recorder_unsupported: &'static str,
    recorder_error: &'static str,
    recorder_inactive: &'static str,
    buttons: RecorderButtons,
    reminder_on: &'static str,
    reminder_off: &'static str,
    next_steps: [&'static str; 3],
}

static ZH: LocaleCopy = LocaleCopy {
    recorder_idle: "准备就绪：点击“开始录音”练习今天的脚本。",
    recorder_recording: "录音中… 完成后按“停止”，尽量保持语速稳定。",
    recorder_processing: "正在处理录音…几秒后即可播放或下载。",
    recorder_ready: "录音完成！播放确认语气，或保存音频以便复习。",
    recorder_permission: "请允许使用麦克风，我们不会上传音频。",
    recorder_unsupported: "抱歉，当前设备暂不支持录音功能。",
    recorder_error: "录音遇到问题，请重试。",
    recorder_inactive: "选择一个模板并生成计划后，就能在这里练习录音。",
    buttons: RecorderButtons {
        start: "开始录音",
        stop: "停止",
        download: "下载录音",
    },
    reminder_on: "已为你开启每日提醒，建议立刻在日历或提醒工具中设定时间。",
    reminder_off: "我们会在本地保存提醒标记，并引导你把练习写进日历或待办。",
    next_steps: ["下一步", "查看计划", "开始践行"],
};

static EN: LocaleCopy = LocaleCopy {
    recorder_idle: "Ready to go: press “Start recording” to rehearse today’s script.",
    recorder_recording: "Recording… speak with intention, then hit “Stop” when you’re done.",
    recorder_processing: "Processing your audio… you can replay or download in a moment.",
    recorder_ready: "All set! Replay the clip to check your tone or download it for later.",
    recorder_permission: "Please allow microphone access. Nothing leaves your device.",
    recorder_unsupported: "Recording is not supported on this device.",
    recorder_error: "Something went wrong while recording. Give it another try.",
    recorder_inactive: "Generate your daily plan first, then the recorder will be ready here.",
    buttons: RecorderButtons {
        start: "Start recording",
        stop: "Stop",
        download: "Download audio",
    },
    reminder_on: "Daily reminder saved locally. Add it to your calendar or to-do app right away.",
    reminder_off: "We store this preference locally and prompt you to add calendar or to-do reminders.",
    next_steps: ["Next Step", "See Plan", "Start Practice"],
};

impl Locale {
    fn copy(self) -> &'static LocaleCopy {
        match self {
            Locale::Zh => &ZH,
            Locale::En => &EN,
        }
    }

    /// User-facing text for a recorder status signal.
    pub fn recorder_status_text(self, status: RecorderStatus) -> &'static str {
        let copy = self.copy();
        match status {
            RecorderStatus::Idle => copy.recorder_idle,
            RecorderStatus::Recording => copy.recorder_recording,
            RecorderStatus::Processing => copy.recorder_processing,
            RecorderStatus::Ready => copy.recorder_ready,
            RecorderStatus::RequestingPermission | RecorderStatus::PermissionDenied => {
                copy.recorder_permission
            }
            RecorderStatus::Unsupported => copy.recorder_unsupported,
            RecorderStatus::DeviceError => copy.recorder_error,
            RecorderStatus::Inactive => copy.recorder_inactive,
        }
    }

    pub fn recorder_buttons(self) -> RecorderButtons {
        self.copy().buttons
    }

    /// Note shown next to the daily-reminder toggle.
    pub fn reminder_note(self, enabled: bool) -> &'static str {
        let copy = self.copy();
        if enabled {
            copy.reminder_on
        } else {
            copy.reminder_off
        }
    }

    /// Label for the wizard's next button on a given 1-based step.
    pub fn next_step_label(self, step: u32) -> &'static str {
        let labels = &self.copy().next_steps;
        let index = (step.clamp(1, labels.len() as u32) - 1) as usize;
        labels[index]
    }

    /// "Day N" heading for a plan card.
    pub fn day_label(self, day: u32) -> String {
        match self {
            Locale::Zh => format!("第 {} 天", day),
            Locale::En => format!("Day {}", day),
        }
    }
}
