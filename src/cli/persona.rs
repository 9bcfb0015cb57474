use super::ui;
use crate::core::persona::{self, Assessment, ClientProfile, MAX_SCORE};
use anyhow::Result;
use chrono::{Datelike, Local};
use comfy_table::Cell;
use std::path::Path;

pub fn run(profile_path: &Path) -> Result<()> {
    let profile = ClientProfile::load_from_path(profile_path)?;
    let assessment = persona::assess(&profile, Local::now().year());
    println!("{}", render(&assessment));
    Ok(())
}

pub fn render(assessment: &Assessment) -> String {
    let details = assessment.label.profile();
    let mut output = format!(
        "{}\n{}\n\n",
        ui::style_text(&assessment.label.to_string(), ui::StyleType::Title),
        ui::style_text(details.description, ui::StyleType::Subtle)
    );

    let breakdown = assessment.breakdown;
    let mut scores = ui::new_styled_table();
    scores.set_header(vec![ui::header_cell("Factor"), ui::header_cell("Points")]);
    for (factor, points, max) in [
        ("Age", breakdown.age, 3),
        ("Employment", breakdown.employment, 2),
        ("Emergency fund", breakdown.emergency_fund, 2),
        ("Debt load", breakdown.debt_load, 1),
        ("Experience", breakdown.experience, 2),
        ("Risk appetite", breakdown.risk_appetite, 3),
        ("Goal horizon", breakdown.goal_horizon, 2),
    ] {
        scores.add_row(vec![
            Cell::new(factor),
            ui::number_cell(format!("{points}/{max}")),
        ]);
    }
    output.push_str(&scores.to_string());
    output.push_str(&format!(
        "\n{} {}\n\n",
        ui::style_text("Score:", ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{}/{}", assessment.score, MAX_SCORE),
            ui::StyleType::TotalValue
        )
    ));

    let allocation = details.allocation;
    let mut mix = ui::new_styled_table();
    mix.set_header(vec![
        ui::header_cell("Equity"),
        ui::header_cell("Debt"),
        ui::header_cell("Hybrid"),
        ui::header_cell("Alternatives"),
    ]);
    mix.add_row(vec![
        ui::number_cell(format!("{}%", allocation.equity)),
        ui::number_cell(format!("{}%", allocation.debt)),
        ui::number_cell(format!("{}%", allocation.hybrid)),
        ui::number_cell(format!("{}%", allocation.alternatives)),
    ]);
    output.push_str(&mix.to_string());
    output.push_str(&format!("\n{}", details.traits.join(" · ")));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::persona::PersonaLabel;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_render_shows_label_score_and_allocation() {
        let assessment = persona::assess(&ClientProfile::default(), 2026);
        let output = render(&assessment);

        assert_eq!(assessment.label, PersonaLabel::CapitalGuardian);
        assert!(output.contains("Capital Guardian"));
        assert!(output.contains("0/15"));
        assert!(output.contains("50%"));
        assert!(output.contains("Risk averse"));
    }

    #[test]
    fn test_run_reads_profile_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "employmentType: Salaried\nriskAppetite: Aggressive")?;
        run(file.path())?;

        assert!(run(Path::new("/no/such/profile.yaml")).is_err());
        Ok(())
    }
}
