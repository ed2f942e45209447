//! Saída de terminal do painel: spinners e tabelas coloridas.
//!
//! Usa `indicatif` para o spinner enquanto uma chamada ao BFF está em curso
//! e `console` para estilizar status, badges e mensagens de resultado.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::board::{Cell, ClassBoard, Layout, Pager, ParticipationRow};
use crate::enrollment::EnrollmentBadge;
use crate::submission::{PanelMode, SubmissionView};

/// Spinner exibido durante uma chamada ao BFF.
pub struct Progress {
    pb: ProgressBar,
    green: Style,
    red: Style,
}

impl Progress {
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
        }
    }

    pub fn success(&self, message: &str) {
        self.pb.finish_and_clear();
        println!("  {} {message}", self.green.apply_to("✓"));
    }

    pub fn failure(&self, message: &str) {
        self.pb.finish_and_clear();
        println!("  {} {message}", self.red.apply_to("✗"));
    }

    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}

/// Texto curto de uma célula, com a cor correspondente ao status.
pub fn cell_label(view: &SubmissionView<'_>) -> (String, Style) {
    match view {
        SubmissionView::Files {
            items,
            panel: PanelMode::Editable,
        } => (
            format!("recebida ({} arq.)", items.len()),
            Style::new().yellow(),
        ),
        SubmissionView::Files {
            panel: PanelMode::Summary(feedback),
            ..
        }
        | SubmissionView::EvaluatedWithoutFiles(feedback) => {
            let note = feedback
                .map(|f| format!(" {:.1}", f.note))
                .unwrap_or_default();
            (format!("avaliada{note}"), Style::new().green())
        }
        SubmissionView::ReceivedWithoutFiles => {
            ("recebida (outro canal)".to_string(), Style::new().cyan())
        }
        SubmissionView::ExternalChannel => {
            ("recebida em outro canal".to_string(), Style::new().cyan())
        }
        SubmissionView::NotReceived => ("não recebida".to_string(), Style::new().red()),
        SubmissionView::Unrecognized(raw) => (format!("? {raw}"), Style::new().magenta()),
        SubmissionView::NotFound => ("—".to_string(), Style::new().dim()),
    }
}

pub fn badge_style(badge: EnrollmentBadge) -> Style {
    match badge {
        EnrollmentBadge::Active => Style::new().green(),
        EnrollmentBadge::Cancelled => Style::new().red(),
        EnrollmentBadge::CancelRequested => Style::new().yellow(),
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.chars().take(width).collect()
    } else {
        format!("{text}{}", " ".repeat(width - len))
    }
}

const NAME_WIDTH: usize = 24;
const CELL_WIDTH: usize = 24;

/// Imprime o acompanhamento no layout pedido.
pub fn print_board(board: &ClassBoard, cells: &[(String, Vec<Cell<'_>>)], layout: Layout, pager: &Pager) {
    let title = Style::new().bold();
    println!("{}", title.apply_to(format!("{} — {}", board.class.name, board.class.course_name)));
    if layout == Layout::Paged {
        println!(
            "Atividade {}/{}{}{}",
            pager.index() + 1,
            pager.total(),
            if pager.has_prev() { "  ‹ anterior" } else { "" },
            if pager.has_next() { "  próxima ›" } else { "" },
        );
    }
    println!();

    let mut header = pad("Participante", NAME_WIDTH);
    for (activity, _) in cells {
        header.push_str(&pad(activity, CELL_WIDTH));
    }
    println!("{}", title.apply_to(header));

    for (row, student) in board.students.iter().enumerate() {
        print!("{}", pad(&student.name, NAME_WIDTH));
        for (_, column) in cells {
            if let Some(cell) = column.get(row) {
                let (label, style) = cell_label(&cell.view);
                print!("{}", style.apply_to(pad(&label, CELL_WIDTH)));
            }
        }
        println!();
    }
}

pub fn print_participation(rows: &[ParticipationRow<'_>]) {
    let title = Style::new().bold();
    println!(
        "{}",
        title.apply_to(format!(
            "{}{}{}",
            pad("Participante", NAME_WIDTH),
            pad("Matrícula", CELL_WIDTH),
            "Atividades"
        ))
    );
    for row in rows {
        let activities: Vec<String> = row
            .activities
            .iter()
            .map(|(index, done)| format!("{index}:{}", if *done { "✓" } else { "·" }))
            .collect();
        let lock = if row.can_toggle { "" } else { " (bloqueado)" };
        println!(
            "{}{}{}{lock}",
            pad(&row.student.name, NAME_WIDTH),
            badge_style(row.badge).apply_to(pad(&row.badge.to_string(), CELL_WIDTH)),
            activities.join(" ")
        );
    }
}

/// Detalhe de uma célula: status, arquivos, avaliação e ações disponíveis.
pub fn print_cell(cell: &Cell<'_>) {
    let (label, style) = cell_label(&cell.view);
    println!("{} — {}", cell.student.name, style.apply_to(label));

    if let SubmissionView::Files { items, panel } = &cell.view {
        for item in items.iter() {
            println!("  • {} ({})", item.name, item.content_type);
        }
        match panel {
            PanelMode::Summary(Some(feedback)) => {
                println!("  Nota: {:.1}", feedback.note);
                println!("  Comentário: {}", feedback.comment);
            }
            PanelMode::Summary(None) => println!("  Avaliação não disponível"),
            PanelMode::Editable => println!("  Aguardando avaliação (painel evaluate)"),
        }
    }
    if let Some(link) = &cell.whatsapp {
        println!("  WhatsApp: {link}");
    }
    if cell.can_navigate_as {
        println!("  Navegar como participante: painel participant enter {}", cell.student.id);
    }
}
