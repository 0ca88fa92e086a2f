//! Transition table coverage.

use rstest::rstest;

use super::*;

fn email() -> EmailAddress {
    EmailAddress::parse("owner@example.com").expect("valid email")
}

fn advertisers() -> Vec<Advertiser> {
    vec![Advertiser::new("7001", "Acme"), Advertiser::new("7002", "Beta")]
}

fn pixel(code: &str) -> Pixel {
    Pixel::new(format!("id-{code}"), code, format!("name-{code}"))
}

fn selecting() -> Stage {
    Stage::SelectingPixel(Selection {
        advertisers: advertisers(),
        selected_advertiser: Some("7001".to_owned()),
        pixels: vec![pixel("C1")],
    })
}

fn ready() -> Stage {
    Stage::PixelReady(PixelContext {
        advertisers: advertisers(),
        advertiser_id: "7001".to_owned(),
        pixels: vec![pixel("C1")],
        pixel: pixel("C1"),
    })
}

fn stages() -> Vec<Stage> {
    let context = PixelContext {
        advertisers: advertisers(),
        advertiser_id: "7001".to_owned(),
        pixels: vec![pixel("C1")],
        pixel: pixel("C1"),
    };
    vec![
        Stage::initial(),
        Stage::Unauthenticated {
            access_verified_for: Some(email()),
        },
        Stage::SelectingPixel(Selection::default()),
        Stage::PixelReady(context.clone()),
        Stage::EventSent(context.clone()),
        Stage::ExternalConfigAcknowledged(context),
    ]
}

#[rstest]
fn reset_is_accepted_from_every_stage() {
    for stage in stages() {
        assert_eq!(transition(&stage, Event::Reset), Ok(Stage::initial()));
    }
}

#[rstest]
fn happy_path_advances_one_step_at_a_time() {
    let stage = transition(&Stage::initial(), Event::AccessGranted(email())).expect("gate");
    let stage = transition(&stage, Event::Authorized).expect("authorized");
    assert_eq!(stage.name().step(), 2);
    let stage = transition(&stage, Event::AdvertisersLoaded(advertisers())).expect("listed");
    let stage =
        transition(&stage, Event::AdvertiserSelected("7002".to_owned())).expect("selected");
    let stage = transition(
        &stage,
        Event::PixelCreated {
            advertiser_id: "7002".to_owned(),
            pixel: pixel("PX1"),
        },
    )
    .expect("created");
    assert_eq!(stage.name(), StageName::PixelReady);
    let stage = transition(&stage, Event::EventSent).expect("sent");
    let stage = transition(&stage, Event::ExternalConfigAcknowledged).expect("acknowledged");
    assert_eq!(stage.name().step(), 5);
}

#[rstest]
#[case(Stage::initial(), Event::EventSent)]
#[case(Stage::initial(), Event::PixelSelected("C1".to_owned()))]
#[case(Stage::initial(), Event::AdvertisersLoaded(Vec::new()))]
#[case(selecting(), Event::Authorized)]
#[case(selecting(), Event::EventSent)]
#[case(selecting(), Event::AccessGranted(email()))]
#[case(ready(), Event::PixelSelected("C1".to_owned()))]
#[case(ready(), Event::ExternalConfigAcknowledged)]
#[case(ready(), Event::AdvertiserSelected("7001".to_owned()))]
fn out_of_order_events_are_rejected(#[case] stage: Stage, #[case] event: Event) {
    let name = event.name();
    assert_eq!(
        transition(&stage, event),
        Err(TransitionError::Invalid {
            stage: stage.name(),
            event: name,
        })
    );
}

#[rstest]
fn event_sent_is_terminal_for_sending() {
    let ready = ready();
    let sent = transition(&ready, Event::EventSent).expect("sent");
    assert!(matches!(
        transition(&sent, Event::EventSent),
        Err(TransitionError::Invalid { .. })
    ));
}

#[rstest]
fn selecting_an_unlisted_advertiser_fails() {
    let selecting = selecting();
    assert_eq!(
        transition(&selecting, Event::AdvertiserSelected("9999".to_owned())),
        Err(TransitionError::UnknownAdvertiser {
            advertiser_id: "9999".to_owned()
        })
    );
}

#[rstest]
fn changing_advertiser_clears_known_pixels() {
    let selecting = selecting();
    let next = transition(&selecting, Event::AdvertiserSelected("7002".to_owned()))
        .expect("selection accepted");
    let Stage::SelectingPixel(selection) = next else {
        panic!("expected selecting stage");
    };
    assert!(selection.pixels.is_empty());
}

#[rstest]
fn stale_pixel_lists_are_rejected() {
    let selecting = selecting();
    let result = transition(
        &selecting,
        Event::PixelsLoaded {
            advertiser_id: "7002".to_owned(),
            pixels: vec![pixel("C9")],
        },
    );
    assert_eq!(
        result,
        Err(TransitionError::StaleAdvertiser {
            advertiser_id: "7002".to_owned()
        })
    );
}

#[rstest]
fn selected_pixel_must_be_listed() {
    let selecting = selecting();
    assert_eq!(
        transition(&selecting, Event::PixelSelected("C404".to_owned())),
        Err(TransitionError::UnknownPixel {
            pixel_code: "C404".to_owned()
        })
    );
    let ready = transition(&selecting, Event::PixelSelected("C1".to_owned())).expect("listed");
    assert_eq!(
        ready.pixel_context().map(|context| context.pixel.pixel_code.as_str()),
        Some("C1")
    );
}

#[rstest]
fn created_pixel_is_merged_into_known_pixels() {
    let selecting = selecting();
    let ready = transition(
        &selecting,
        Event::PixelCreated {
            advertiser_id: "7001".to_owned(),
            pixel: pixel("C2"),
        },
    )
    .expect("created");
    let refreshed = transition(
        &ready,
        Event::PixelsLoaded {
            advertiser_id: "7001".to_owned(),
            pixels: vec![pixel("C1")],
        },
    )
    .expect("refresh accepted");
    let codes: Vec<_> = refreshed
        .pixel_context()
        .map(|context| context.pixels.iter().map(|p| p.pixel_code.clone()).collect())
        .unwrap_or_default();
    assert_eq!(codes, vec!["C1".to_owned(), "C2".to_owned()]);
}

#[rstest]
fn pixel_creation_requires_a_selected_advertiser() {
    let stage = transition(
        &Stage::SelectingPixel(Selection {
            advertisers: advertisers(),
            ..Selection::default()
        }),
        Event::PixelCreated {
            advertiser_id: "7001".to_owned(),
            pixel: pixel("C2"),
        },
    );
    assert!(stage.is_err());
}

#[rstest]
fn reloading_advertisers_keeps_a_listed_selection() {
    let selecting = selecting();
    let next = transition(&selecting, Event::AdvertisersLoaded(advertisers())).expect("reloaded");
    let Stage::SelectingPixel(selection) = next else {
        panic!("expected selecting stage");
    };
    assert_eq!(selection.selected_advertiser.as_deref(), Some("7001"));
    assert_eq!(selection.pixels.len(), 1);
}
