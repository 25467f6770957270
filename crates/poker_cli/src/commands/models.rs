//! Models command - List the selectable models.

use anyhow::Result;

use poker_chat::ModelId;

pub async fn execute() -> Result<()> {
    for model in ModelId::ALL {
        let marker = if model == ModelId::default() {
            " (default)"
        } else {
            ""
        };
        println!("  {}{}", model, marker);
        println!("      {}", model.description());
    }
    Ok(())
}
