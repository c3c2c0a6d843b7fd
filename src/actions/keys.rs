#[cfg(target_os = "windows")]
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
    KEYEVENTF_UNICODE, VIRTUAL_KEY,
};

/// Type `text` into the focused window as unicode key events.
pub fn send_text(text: &str) -> anyhow::Result<()> {
    if text.is_empty() {
        return Ok(());
    }

    #[cfg(not(target_os = "windows"))]
    {
        anyhow::bail!("key injection is only supported on Windows");
    }

    #[cfg(target_os = "windows")]
    {
        for ch in text.encode_utf16() {
            send_unicode(ch)?;
        }
        Ok(())
    }
}

/// Press and release a single named key such as `space` or `enter`.
pub fn press_key(token: &str) -> anyhow::Result<()> {
    let vk = key_code(token).ok_or_else(|| anyhow::anyhow!("unknown key token '{token}'"))?;

    #[cfg(not(target_os = "windows"))]
    {
        let _ = vk;
        anyhow::bail!("key injection is only supported on Windows");
    }

    #[cfg(target_os = "windows")]
    {
        send_vk(VIRTUAL_KEY(vk), KEYBD_EVENT_FLAGS(0))?;
        send_vk(VIRTUAL_KEY(vk), KEYEVENTF_KEYUP)
    }
}

/// Press `tokens` in order, then release them in reverse (`ctrl`, `enter`).
pub fn press_chord(tokens: &[String]) -> anyhow::Result<()> {
    if tokens.is_empty() {
        anyhow::bail!("empty key chord");
    }
    let codes = tokens
        .iter()
        .map(|token| {
            key_code(token).ok_or_else(|| anyhow::anyhow!("unknown key token '{token}'"))
        })
        .collect::<anyhow::Result<Vec<u16>>>()?;

    #[cfg(not(target_os = "windows"))]
    {
        let _ = codes;
        anyhow::bail!("key injection is only supported on Windows");
    }

    #[cfg(target_os = "windows")]
    {
        for &vk in &codes {
            send_vk(VIRTUAL_KEY(vk), KEYBD_EVENT_FLAGS(0))?;
        }
        for &vk in codes.iter().rev() {
            send_vk(VIRTUAL_KEY(vk), KEYEVENTF_KEYUP)?;
        }
        Ok(())
    }
}

/// Win32 virtual-key code for a key name. Names are case-insensitive.
pub fn key_code(token: &str) -> Option<u16> {
    let t = token.trim().to_ascii_lowercase();
    let code = match t.as_str() {
        "" => return None,
        "ctrl" | "control" => 0x11,
        "shift" => 0x10,
        "alt" => 0x12,
        "win" | "windows" | "lwin" => 0x5B,
        "enter" | "return" => 0x0D,
        "tab" => 0x09,
        "esc" | "escape" => 0x1B,
        "space" => 0x20,
        "backspace" | "bksp" => 0x08,
        "delete" | "del" => 0x2E,
        "insert" | "ins" => 0x2D,
        "home" => 0x24,
        "end" => 0x23,
        "pageup" | "pgup" => 0x21,
        "pagedown" | "pgdn" => 0x22,
        "up" => 0x26,
        "down" => 0x28,
        "left" => 0x25,
        "right" => 0x27,
        _ => return function_key(&t).or_else(|| alphanumeric(&t)),
    };
    Some(code)
}

// F1..F24 map to 0x70..0x87.
fn function_key(t: &str) -> Option<u16> {
    let n: u16 = t.strip_prefix('f')?.parse().ok()?;
    (1..=24).contains(&n).then(|| 0x6F + n)
}

fn alphanumeric(t: &str) -> Option<u16> {
    let mut chars = t.chars();
    let ch = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    if ch.is_ascii_alphabetic() {
        return Some(ch.to_ascii_uppercase() as u16);
    }
    if ch.is_ascii_digit() {
        return Some(ch as u16);
    }
    None
}

#[cfg(target_os = "windows")]
fn keyboard_input(vk: VIRTUAL_KEY, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

#[cfg(target_os = "windows")]
fn send_inputs(inputs: &[INPUT]) -> anyhow::Result<()> {
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        anyhow::bail!("SendInput injected {sent} of {} events", inputs.len());
    }
    Ok(())
}

#[cfg(target_os = "windows")]
fn send_vk(vk: VIRTUAL_KEY, flags: KEYBD_EVENT_FLAGS) -> anyhow::Result<()> {
    send_inputs(&[keyboard_input(vk, 0, flags)])
}

#[cfg(target_os = "windows")]
fn send_unicode(unit: u16) -> anyhow::Result<()> {
    let up = KEYBD_EVENT_FLAGS(KEYEVENTF_UNICODE.0 | KEYEVENTF_KEYUP.0);
    send_inputs(&[
        keyboard_input(VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE),
        keyboard_input(VIRTUAL_KEY(0), unit, up),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keys_resolve() {
        assert_eq!(key_code("space"), Some(0x20));
        assert_eq!(key_code("Enter"), Some(0x0D));
        assert_eq!(key_code(" CTRL "), Some(0x11));
    }

    #[test]
    fn letters_digits_and_function_keys() {
        assert_eq!(key_code("o"), Some(b'O' as u16));
        assert_eq!(key_code("7"), Some(b'7' as u16));
        assert_eq!(key_code("F1"), Some(0x70));
        assert_eq!(key_code("f24"), Some(0x87));
        assert_eq!(key_code("f25"), None);
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        assert_eq!(key_code(""), None);
        assert_eq!(key_code("hyper"), None);
        assert!(press_chord(&["ctrl".into(), "hyper".into()]).is_err());
        assert!(press_chord(&[]).is_err());
    }
}
