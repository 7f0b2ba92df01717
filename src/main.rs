use std::sync::Arc;

use dotenv::dotenv;
use flag_quiz_bot::{
    config::Config,
    gateway::HttpGateway,
    leaderboard,
    quiz::{engine, scheduler::RoundScheduler, Game, GameState},
    view::{self, Notice},
};
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{ChatAction, InputFile, KeyboardRemove},
    utils::command::BotCommands,
};

type QuizDialogue = Dialogue<GameState, ErasedStorage<GameState>>;
type QuizStorage = Arc<ErasedStorage<GameState>>;
type Scheduler = Arc<RoundScheduler<ChatId>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Flag Quiz commands:")]
enum Command {
    #[command(description = "start a new game")]
    Start,
    #[command(description = "reload the countries and start over")]
    Retry,
    #[command(description = "show the leaderboard")]
    Scores,
    #[command(description = "save your score, e.g. /save Ada")]
    Save(String),
    #[command(description = "end the current game")]
    Stop,
    #[command(description = "show this text")]
    Help,
}

#[tokio::main]
async fn main() -> HandlerResult {
    let dotenv_loaded = dotenv().is_ok();

    pretty_env_logger::init();
    log::info!("Starting flag quiz bot...");
    if !dotenv_loaded {
        log::warn!("No .env file found, using the process environment");
    }

    let config = Config::from_env()?;
    log::info!(
        "Backend at {}, next round after {:?}",
        config.api_url,
        config.advance_delay
    );

    let bot = Bot::from_env();
    bot.set_my_commands(Command::bot_commands()).await?;

    log::info!("Opening dialogue storage at {}", config.storage_path);
    let storage: QuizStorage = SqliteStorage::open(&config.storage_path, Json)
        .await?
        .erase();

    let gateway = Arc::new(HttpGateway::new(
        config.api_url.clone(),
        config.request_timeout,
    )?);
    let scheduler: Scheduler = Arc::new(RoundScheduler::new(config.advance_delay));

    let handler = Update::filter_message()
        .enter_dialogue::<Message, ErasedStorage<GameState>, GameState>()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(command),
        )
        .branch(dptree::case![GameState::Loading].endpoint(start))
        .branch(dptree::case![GameState::Ready(game)].endpoint(play))
        .branch(dptree::case![GameState::Unplayable { reason }].endpoint(unplayable));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![storage, gateway, scheduler.clone()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    // No round may advance once the chats are gone
    scheduler.cancel_all();
    log::info!("Flag quiz bot stopped");
    Ok(())
}

async fn command(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    cmd: Command,
    gateway: Arc<HttpGateway>,
    scheduler: Scheduler,
    storage: QuizStorage,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    match cmd {
        Command::Start | Command::Retry => reload(&bot, &dialogue, &gateway, &scheduler).await,
        Command::Scores => show_leaderboard(&bot, chat_id, &gateway).await,
        Command::Save(name) => match dialogue.get().await? {
            Some(GameState::Ready(game)) => {
                save(&bot, &dialogue, game, &name, &gateway, &scheduler, storage).await
            }
            _ => {
                bot.send_message(chat_id, "There is no score to save yet, send /start to play")
                    .await?;
                Ok(())
            }
        },
        Command::Stop => {
            scheduler.cancel(&chat_id);
            let final_score = match dialogue.get().await? {
                Some(GameState::Ready(game)) => game.score(),
                _ => 0,
            };
            dialogue.exit().await?;
            log::info!("Chat {} stopped with {} points", chat_id, final_score);

            bot.send_message(
                chat_id,
                format!(
                    "Game over! Final score: {}\nSend /start to play again.",
                    final_score
                ),
            )
            .reply_markup(KeyboardRemove::new())
            .await?;
            Ok(())
        }
        Command::Help => {
            bot.send_message(chat_id, Command::descriptions().to_string())
                .await?;
            Ok(())
        }
    }
}

async fn start(
    bot: Bot,
    dialogue: QuizDialogue,
    gateway: Arc<HttpGateway>,
    scheduler: Scheduler,
) -> HandlerResult {
    reload(&bot, &dialogue, &gateway, &scheduler).await
}

/// Drops whatever game the chat had and builds a new one from a fresh country list.
async fn reload(
    bot: &Bot,
    dialogue: &QuizDialogue,
    gateway: &HttpGateway,
    scheduler: &RoundScheduler<ChatId>,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();
    scheduler.cancel(&chat_id);
    dialogue.update(GameState::Loading).await?;
    log::info!("Loading a new game for chat {}", chat_id);

    bot.send_message(chat_id, view::greeting()).await?;
    // Only a hint that something is happening, losing it changes nothing
    let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;

    let result = engine::load_countries(gateway).await;
    let state = {
        let mut rng = rand::thread_rng();
        GameState::loaded(result, &mut rng)
    };
    dialogue.update(state.clone()).await?;

    match state {
        GameState::Ready(game) => send_round(bot, chat_id, &game).await,
        GameState::Unplayable { reason } => {
            bot.send_message(chat_id, view::unplayable(&reason))
                .reply_markup(view::retry_keyboard())
                .await?;
            Ok(())
        }
        GameState::Loading => Ok(()),
    }
}

async fn unplayable(
    bot: Bot,
    dialogue: QuizDialogue,
    reason: String,
    msg: Message,
    gateway: Arc<HttpGateway>,
    scheduler: Scheduler,
) -> HandlerResult {
    if msg.text() == Some(view::RETRY_BUTTON) {
        return reload(&bot, &dialogue, &gateway, &scheduler).await;
    }

    bot.send_message(msg.chat.id, view::unplayable(&reason))
        .reply_markup(view::retry_keyboard())
        .await?;
    Ok(())
}

const PICK_AN_OPTION: &str = "Please pick one of the countries on the keyboard";

async fn play(
    bot: Bot,
    dialogue: QuizDialogue,
    game: Game,
    msg: Message,
    gateway: Arc<HttpGateway>,
    scheduler: Scheduler,
    storage: QuizStorage,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let Some(text) = msg.text() else {
        bot.send_message(chat_id, PICK_AN_OPTION).await?;
        return Ok(());
    };

    match text {
        view::LEADERBOARD_BUTTON => return show_leaderboard(&bot, chat_id, &gateway).await,
        view::SAVE_BUTTON => {
            dialogue.update(GameState::Ready(game.ask_for_name())).await?;
            bot.send_message(chat_id, "What name should the score be saved under?")
                .reply_markup(KeyboardRemove::new())
                .await?;
            return Ok(());
        }
        _ => {}
    }

    if game.is_awaiting_name() {
        return save(&bot, &dialogue, game, text, &gateway, &scheduler, storage).await;
    }

    if game.is_judged() {
        // The timer does not outlive a restart, the stored game would wait forever
        if !scheduler.is_pending(&chat_id) {
            schedule_advance(&scheduler, bot.clone(), storage, chat_id, game.round_no());
        }
        bot.send_message(chat_id, "The next flag is on its way...")
            .await?;
        return Ok(());
    }

    let Some(choice) = game.round().offered_by_name(text).cloned() else {
        bot.send_message(chat_id, PICK_AN_OPTION)
            .reply_markup(view::round_keyboard(game.round()))
            .await?;
        return Ok(());
    };

    let (game, verdict) = game.guess(&choice);
    let Some(verdict) = verdict else {
        return Ok(());
    };
    log::debug!(
        "Chat {} guessed {} for {}: {}",
        chat_id,
        choice.name,
        verdict.correct_answer.name,
        verdict.correct
    );

    let round_no = game.round_no();
    let score = game.score();
    dialogue.update(GameState::Ready(game)).await?;

    bot.send_message(
        chat_id,
        format!("{}\n{}", Notice::from(&verdict).text(), view::score_line(score)),
    )
    .await?;

    schedule_advance(&scheduler, bot, storage, chat_id, round_no);
    Ok(())
}

fn schedule_advance(
    scheduler: &RoundScheduler<ChatId>,
    bot: Bot,
    storage: QuizStorage,
    chat_id: ChatId,
    round_no: u64,
) {
    scheduler.schedule(chat_id, async move {
        if let Err(err) = advance_round(bot, storage, chat_id, round_no).await {
            log::error!("Failed to advance round {} in chat {}: {}", round_no, chat_id, err);
        }
    });
}

async fn advance_round(
    bot: Bot,
    storage: QuizStorage,
    chat_id: ChatId,
    round_no: u64,
) -> HandlerResult {
    let dialogue = QuizDialogue::new(storage, chat_id);
    let game = match dialogue.get().await? {
        Some(GameState::Ready(game)) if game.awaits_advance_from(round_no) => {
            if game.is_awaiting_name() {
                // Picked up again once the name prompt is answered
                log::debug!("Round {} in chat {} waits for a player name", round_no, chat_id);
                return Ok(());
            }
            game
        }
        _ => {
            log::debug!("Round {} in chat {} is no longer current", round_no, chat_id);
            return Ok(());
        }
    };

    let next = {
        let mut rng = rand::thread_rng();
        game.advance(&mut rng)
    };

    match next {
        Ok(game) => {
            dialogue.update(GameState::Ready(game.clone())).await?;
            send_round(&bot, chat_id, &game).await
        }
        Err(err) => {
            log::error!("Could not build the next round in chat {}: {}", chat_id, err);
            dialogue.update(GameState::Loading).await?;
            bot.send_message(chat_id, Notice::from(&err).text())
                .reply_markup(KeyboardRemove::new())
                .await?;
            Ok(())
        }
    }
}

async fn send_round(bot: &Bot, chat_id: ChatId, game: &Game) -> HandlerResult {
    let round = game.round();
    let flag_url = &round.candidate().flag_url;
    let caption = view::round_caption(game);

    if let Ok(url) = reqwest::Url::parse(flag_url) {
        match bot
            .send_photo(chat_id, InputFile::url(url))
            .caption(caption.clone())
            .reply_markup(view::round_keyboard(round))
            .await
        {
            Ok(_) => return Ok(()),
            Err(err) => log::warn!("Telegram refused the flag at {}: {}", flag_url, err),
        }
    }

    // Telegram does not take every image format, a plain link still shows the flag
    bot.send_message(chat_id, format!("{}\n{}", caption, flag_url))
        .reply_markup(view::round_keyboard(round))
        .await?;
    Ok(())
}

async fn save(
    bot: &Bot,
    dialogue: &QuizDialogue,
    game: Game,
    player_name: &str,
    gateway: &HttpGateway,
    scheduler: &RoundScheduler<ChatId>,
    storage: QuizStorage,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();
    let result = engine::submit_score(gateway, player_name, game.score()).await;
    if let Err(err) = &result {
        log::warn!("Chat {} could not save its score: {}", chat_id, err);
    }

    // The advance timer may have stored a newer round while the score was being posted
    let current = match dialogue.get().await? {
        Some(GameState::Ready(current)) => current,
        _ => game,
    };
    let game = current.after_save(&result);
    dialogue.update(GameState::Ready(game.clone())).await?;

    let notice = view::save_notice(&result);
    if game.is_awaiting_name() {
        bot.send_message(chat_id, notice.text())
            .reply_markup(KeyboardRemove::new())
            .await?;
        return Ok(());
    }

    bot.send_message(
        chat_id,
        format!("{}\n{}", notice.text(), view::score_line(game.score())),
    )
    .reply_markup(view::round_keyboard(game.round()))
    .await?;

    // An advance held back by the name prompt
    if game.is_judged() && !scheduler.is_pending(&chat_id) {
        schedule_advance(scheduler, bot.clone(), storage, chat_id, game.round_no());
    }
    Ok(())
}

async fn show_leaderboard(bot: &Bot, chat_id: ChatId, gateway: &HttpGateway) -> HandlerResult {
    let text = match leaderboard::load_scores(gateway).await {
        Ok(entries) => leaderboard::render(&entries),
        Err(err) => {
            log::warn!("Leaderboard unavailable: {}", err);
            Notice::from(&err).text()
        }
    };
    bot.send_message(chat_id, text).await?;
    Ok(())
}
