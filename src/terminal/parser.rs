//! Escape/ANSI state machine (C5): a `vte::Perform` implementation over
//! [`TerminalState`] driving the byte-at-a-time automaton of spec §4.5.
//!
//! The byte-level state machine (`GROUND`/`ESC`/`CSI`/`OSC`, malformed-escape
//! recovery back to `GROUND`) is provided by the `vte` crate, the same
//! dependency the teacher (`realAndi-Rain`) uses for exactly this purpose;
//! this module supplies only the dispatch semantics of spec §4.5's tables,
//! trimmed to the finals and SGR codes the spec actually names — no DSR/DA
//! query-response machinery, no scroll regions, no bold/italic/strikethrough
//! attributes, since spec §4.5 does not define them.

use super::color::{indexed_to_rgb, Color, Palette};
use super::screen::EraseMode;
use super::screen::TerminalState;

impl TerminalState {
    pub fn flush_print_buffer(&mut self) {
        if self.print_buffer.is_empty() {
            return;
        }
        let cps = std::mem::take(&mut self.print_buffer);
        self.put_codepoints(&cps);
    }

    fn full_reset(&mut self) {
        self.reset();
    }
}

fn param_at(params: &[Vec<i64>], idx: usize, default: i64) -> i64 {
    match params.get(idx).and_then(|g| g.first()) {
        Some(&v) if v != 0 => v,
        _ => default,
    }
}

fn collect_params(params: &vte::Params) -> Vec<Vec<i64>> {
    params
        .iter()
        .map(|group| group.iter().map(|&v| v as i64).collect())
        .collect()
}

impl vte::Perform for TerminalState {
    fn print(&mut self, c: char) {
        self.print_buffer.push(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            0x0D => {
                self.flush_print_buffer();
                self.carriage_return();
            }
            0x0A => {
                self.flush_print_buffer();
                self.line_feed();
            }
            0x08 => {
                self.flush_print_buffer();
                self.backspace();
            }
            0x09 => {
                self.flush_print_buffer();
                self.tab();
            }
            0x07 => {
                // Bell: silently dropped in GROUND per spec §4.5.
            }
            0x01..=0x06 | 0x0B | 0x0C | 0x0E..=0x1F => {
                // Non-control bytes in this range are appended to the text
                // accumulator per spec §4.5, not executed as controls.
                if let Some(c) = char::from_u32(byte as u32) {
                    self.print_buffer.push(c);
                }
            }
            _ => {}
        }
    }

    fn hook(&mut self, _params: &vte::Params, _intermediates: &[u8], _ignore: bool, _action: char) {
        // DCS is not part of spec §4.5's grammar; sequences are absorbed and
        // dropped by `vte`'s automaton.
    }

    fn put(&mut self, _byte: u8) {}

    fn unhook(&mut self) {}

    fn osc_dispatch(&mut self, _params: &[&[u8]], _bell_terminated: bool) {
        // OSC payload interpretation is an open hook per spec §4.5/§9: the
        // parser accepts and discards it.
        tracing::debug!("OSC sequence received and discarded");
    }

    fn csi_dispatch(&mut self, params: &vte::Params, intermediates: &[u8], _ignore: bool, action: char) {
        self.flush_print_buffer();
        let private = intermediates.contains(&b'?');
        let params = collect_params(params);
        let n = || param_at(&params, 0, 1).max(0) as usize;

        if private {
            if matches!(action, 'h' | 'l') {
                let enter = action == 'h';
                for group in &params {
                    match group.first().copied().unwrap_or(0) {
                        47 | 1047 => {
                            if enter {
                                self.switch_to_alternate();
                            } else {
                                self.switch_to_primary();
                            }
                        }
                        1049 => {
                            if enter {
                                self.save_cursor();
                                self.switch_to_alternate();
                            } else {
                                self.switch_to_primary();
                                self.restore_cursor();
                            }
                        }
                        _ => {}
                    }
                }
            }
            return;
        }

        match action {
            'A' => self.move_cursor_rel(-(n() as i64), 0),
            'B' => self.move_cursor_rel(n() as i64, 0),
            'C' => self.move_cursor_rel(0, n() as i64),
            'D' => self.move_cursor_rel(0, -(n() as i64)),
            'E' => {
                for _ in 0..n() {
                    self.line_feed();
                }
                self.carriage_return();
            }
            'F' => {
                for _ in 0..n() {
                    self.move_cursor_rel(-1, 0);
                }
                self.carriage_return();
            }
            'G' => {
                let y = self.active().cursor_y as i64;
                self.move_cursor_abs(y, param_at(&params, 0, 1) - 1);
            }
            'H' | 'f' => {
                let row = param_at(&params, 0, 1) - 1;
                let col = param_at(&params, 1, 1) - 1;
                self.move_cursor_abs(row, col);
            }
            'J' => self.clear_screen(erase_mode(param_at(&params, 0, 0))),
            'K' => self.clear_line(erase_mode(param_at(&params, 0, 0))),
            'L' => self.insert_lines(n()),
            'M' => self.delete_lines(n()),
            'P' => self.delete_chars(n()),
            'X' => self.erase_chars(n()),
            'd' => {
                let x = self.active().cursor_x as i64;
                self.move_cursor_abs(param_at(&params, 0, 1) - 1, x);
            }
            'm' => handle_sgr(self, &params),
            's' => self.save_cursor(),
            'u' => self.restore_cursor(),
            _ => {}
        }
    }

    fn esc_dispatch(&mut self, _intermediates: &[u8], _ignore: bool, byte: u8) {
        self.flush_print_buffer();
        match byte {
            b'7' => self.save_cursor(),
            b'8' => self.restore_cursor(),
            b'c' => self.full_reset(),
            b'D' => self.line_feed(),
            b'E' => {
                self.carriage_return();
                self.line_feed();
            }
            b'H' => {
                // Set tab stop: ignored, per spec §4.5.
            }
            b'M' => {
                let screen = self.active_mut();
                screen.cursor_y = screen.cursor_y.saturating_sub(1);
            }
            _ => {}
        }
    }
}

fn erase_mode(mode: i64) -> EraseMode {
    match mode {
        1 => EraseMode::ToStart,
        2 => EraseMode::All,
        _ => EraseMode::ToEnd,
    }
}

fn handle_sgr(state: &mut TerminalState, params: &[Vec<i64>]) {
    let mut i = 0;
    while i < params.len() {
        let code = params[i].first().copied().unwrap_or(0);
        match code {
            0 => state.attrs = state.default_attrs(),
            4 => {
                state.attrs.ul_on = true;
                state.attrs.ul = state.attrs.fg;
            }
            24 => state.attrs.ul_on = false,
            30..=37 => state.attrs.fg = state.palette.base[(code - 30) as usize],
            90..=97 => state.attrs.fg = state.palette.bright[(code - 90) as usize],
            39 => state.attrs.fg = state.default_fg,
            40..=47 => state.attrs.bg = state.palette.base[(code - 40) as usize],
            100..=107 => state.attrs.bg = state.palette.bright[(code - 100) as usize],
            49 => state.attrs.bg = Color::None,
            38 | 48 => {
                let target_fg = code == 38;
                let mode = params.get(i + 1).and_then(|g| g.first().copied()).unwrap_or(0);
                if mode == 5 {
                    let idx = params.get(i + 2).and_then(|g| g.first().copied()).unwrap_or(0);
                    let color = indexed_to_rgb(idx.clamp(0, 255) as u8, &state.palette);
                    if target_fg { state.attrs.fg = color } else { state.attrs.bg = color }
                    i += 2;
                } else if mode == 2 {
                    let r = params.get(i + 2).and_then(|g| g.first().copied()).unwrap_or(0) as u8;
                    let g = params.get(i + 3).and_then(|g| g.first().copied()).unwrap_or(0) as u8;
                    let b = params.get(i + 4).and_then(|g| g.first().copied()).unwrap_or(0) as u8;
                    let color = Color::rgb(r, g, b);
                    if target_fg { state.attrs.fg = color } else { state.attrs.bg = color }
                    i += 4;
                }
            }
            _ => {}
        }
        i += 1;
    }
}
