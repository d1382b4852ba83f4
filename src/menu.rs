// ============================================================================
// src/menu.rs – Interactive console menu (one state, five actions, quit)
// ============================================================================

use console::Style;
use std::io::BufRead;

use crate::ui::UX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    FlashDisk,
    FlashPartition,
    BuildBootDisk,
    NtfsResize,
    DiskUtility,
    Quit,
}

const ENTRIES: [(MenuChoice, &str); 5] = [
    (MenuChoice::FlashDisk, "Flash image to a whole disk"),
    (MenuChoice::FlashPartition, "Flash image to a partition"),
    (
        MenuChoice::BuildBootDisk,
        "Partition disk (GPT) + install GRUB (UEFI & BIOS)",
    ),
    (MenuChoice::NtfsResize, "Resize / relabel an NTFS partition"),
    (MenuChoice::DiskUtility, "Open graphical disk utility"),
];

/// Map one line of operator input to a choice.
pub fn parse_choice(input: &str) -> Option<MenuChoice> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("q") {
        return Some(MenuChoice::Quit);
    }
    match trimmed.parse::<usize>() {
        Ok(n) if (1..=ENTRIES.len()).contains(&n) => Some(ENTRIES[n - 1].0),
        _ => None,
    }
}

fn render(ui: &UX) {
    if ui.quiet {
        return;
    }
    let frame_style = Style::new().color256(39).bold();
    let row_style = Style::new().color256(252);
    let span = "─".repeat(crate::ui::BANNER_BODY_WIDTH + 2);

    println!();
    println!("{}", frame_style.apply_to(format!("┌{}┐", span)));
    for (idx, (_choice, text)) in ENTRIES.iter().enumerate() {
        let label = format!(" {}. {}", idx + 1, text);
        let body = format!("{:<width$}", label, width = crate::ui::BANNER_BODY_WIDTH + 2);
        println!(
            "{}{}{}",
            frame_style.apply_to("│"),
            row_style.apply_to(body),
            frame_style.apply_to("│")
        );
    }
    let quit = format!("{:<width$}", " q. Quit", width = crate::ui::BANNER_BODY_WIDTH + 2);
    println!(
        "{}{}{}",
        frame_style.apply_to("│"),
        row_style.apply_to(quit),
        frame_style.apply_to("│")
    );
    println!("{}", frame_style.apply_to(format!("└{}┘", span)));
}

/// Show the menu and block until a valid choice arrives.
/// End of input counts as quit.
pub fn show_main_menu(ui: &UX, input: &mut dyn BufRead) -> MenuChoice {
    render(ui);

    loop {
        ui.prompt("Choice [1-5 or q]: ");

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => return MenuChoice::Quit,
            Ok(_) => {}
            Err(_) => {
                ui.warn("Input unreadable, try again.");
                continue;
            }
        }
        match parse_choice(&line) {
            Some(choice) => {
                tracing::debug!(?choice, "menu selection");
                return choice;
            }
            None => ui.warn("Invalid choice: pick 1-5 or 'q'."),
        }
    }
}
