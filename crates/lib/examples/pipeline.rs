use chartgen::{
    catalog::ChartCatalog,
    executor::{ChartgenExecutor, ResolvedTask, TASK_CHART_SUGGESTION, TASK_QUERY_BUILD},
    prompts,
    providers::{
        ai::{gemini::GeminiProvider, open_ai::OpenAiProvider, AiProvider},
        db::DatalakeProvider,
    },
};
use dotenvy::dotenv;
use std::{collections::HashMap, env, sync::Arc};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging and load .env file
    tracing_subscriber::fmt::init();
    dotenv().ok();

    // --- Command-line argument parsing ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} '<prompt>' <project_id> <table_name>", args[0]);
        eprintln!();
        eprintln!(
            "Example: {} 'Show revenue by region' my-project sales_2024",
            args[0]
        );
        return Ok(());
    }
    let prompt = args[1].clone();
    let project_id = &args[2];
    let table_name = &args[3];

    // --- Configuration from environment variables ---
    let ai_provider_name = env::var("AI_PROVIDER").unwrap_or_else(|_| "open_ai".to_string());
    let api_url = env::var("AI_API_URL").expect("AI_API_URL environment variable not set");
    let api_key = env::var("AI_API_KEY").ok();
    let ai_model = env::var("AI_MODEL").ok();
    let datalake_url =
        env::var("DATALAKE_API_URL").unwrap_or_else(|_| "http://localhost:8080/api/v1".to_string());

    // --- Build AI Provider ---
    let ai_provider = match ai_provider_name.as_str() {
        "gemini" => {
            let key = api_key.expect("AI_API_KEY is required for gemini provider");
            Box::new(GeminiProvider::new(api_url, key)?) as Box<dyn AiProvider>
        }
        "open_ai" => {
            Box::new(OpenAiProvider::new(api_url, api_key, ai_model, None)?) as Box<dyn AiProvider>
        }
        _ => anyhow::bail!("Unsupported AI provider: {ai_provider_name}"),
    };

    // --- Wire the executor with the built-in prompts and catalog ---
    let mut providers: HashMap<String, Box<dyn AiProvider>> = HashMap::new();
    providers.insert("default".to_string(), ai_provider);

    let mut tasks = HashMap::new();
    tasks.insert(
        TASK_CHART_SUGGESTION.to_string(),
        ResolvedTask {
            provider: "default".to_string(),
            system_prompt: prompts::SUGGESTION_SYSTEM_PROMPT.to_string(),
            user_prompt: prompts::SUGGESTION_USER_PROMPT.to_string(),
        },
    );
    tasks.insert(
        TASK_QUERY_BUILD.to_string(),
        ResolvedTask {
            provider: "default".to_string(),
            system_prompt: prompts::QUERY_BUILD_SYSTEM_PROMPT.to_string(),
            user_prompt: prompts::QUERY_BUILD_USER_PROMPT.to_string(),
        },
    );

    let backend = DatalakeProvider::new(datalake_url)?;
    let executor = ChartgenExecutor::new(
        Arc::new(providers),
        Arc::new(tasks),
        Arc::new(backend),
        Arc::new(ChartCatalog::default()),
    );

    // --- Execute Prompt ---
    match executor
        .execute_prompt(&[prompt], project_id, table_name)
        .await
    {
        Ok(response) => {
            println!("--- Chart Response ---");
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Err(e) => eprintln!("Error: {e}"),
    }

    Ok(())
}
