//! Registers the kernel library under the names scripts call.
//!
//! Every entry point takes its arguments as `Dynamic` so that fields may be
//! named by string or handle and numbers may be written as ints or floats.
//! A kernel failure is stored on the workspace before it unwinds the
//! script, so the host can report the typed error.

use std::cell::RefCell;
use std::rc::Rc;

use rhai::{Dynamic, Engine, EvalAltResult, Position};

use crate::engine::{RayWorkspace, UnfoldReference};
use crate::kernels::{Comparison, FlagOp, UnfoldParams};
use crate::lifecycle::FieldHandle;
use crate::prelude::{EditError, EditResult};
use crate::script::args::{count, field_handle, integer, missing_or, number, real};

pub(crate) type SharedWorkspace = Rc<RefCell<RayWorkspace>>;
type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

pub(crate) fn runtime_error(error: &EditError) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(Dynamic::from(error.to_string()), Position::NONE).into()
}

fn call(
    shared: &SharedWorkspace,
    op: impl FnOnce(&mut RayWorkspace) -> EditResult<FieldHandle>,
) -> ScriptResult<FieldHandle> {
    let mut workspace = shared.borrow_mut();
    op(&mut workspace).map_err(|error| runtime_error(&workspace.record_error(error)))
}

fn unfold_params(
    nyquist: &Dynamic,
    max_pos: &Dynamic,
    max_neg: &Dynamic,
    averaged: &Dynamic,
) -> EditResult<UnfoldParams> {
    Ok(UnfoldParams {
        nyquist: real("nyquist velocity", nyquist)?,
        max_pos_folds: integer("max positive folds", max_pos)?,
        max_neg_folds: integer("max negative folds", max_neg)?,
        ngates_averaged: count("gates averaged", averaged)?,
    })
}

pub(crate) fn register_kernels(engine: &mut Engine, shared: &SharedWorkspace) {
    engine.register_type_with_name::<FieldHandle>("FieldHandle");
    engine.register_fn("to_string", |handle: &mut FieldHandle| handle.to_string());

    register_motion_and_unfolding(engine, shared);
    register_gate_edits(engine, shared);
    register_flag_generators(engine, shared);
    register_flag_algebra(engine, shared);
    register_flagged(engine, shared);
    register_thresholds(engine, shared);
}

fn register_motion_and_unfolding(engine: &mut Engine, shared: &SharedWorkspace) {
    let ws = shared.clone();
    engine.register_fn(
        "REMOVE_AIRCRAFT_MOTION",
        move |field: Dynamic, nyquist: Dynamic, clip: Dynamic, bad: Dynamic| {
            call(&ws, |w| {
                w.remove_aircraft_motion(
                    &field_handle("field", &field)?,
                    real("nyquist velocity", &nyquist)?,
                    count("clip gate", &clip)?,
                    missing_or(&bad)?,
                )
            })
        },
    );

    for (name, reference) in [
        ("BB_UNFOLDING_FIRST_GOOD_GATE", UnfoldReference::FirstGoodGate),
        ("BB_UNFOLDING_AC_WIND", UnfoldReference::AircraftWind),
    ] {
        let ws = shared.clone();
        engine.register_fn(
            name,
            move |field: Dynamic,
                  nyquist: Dynamic,
                  max_pos: Dynamic,
                  max_neg: Dynamic,
                  averaged: Dynamic,
                  clip: Dynamic,
                  bad: Dynamic| {
                call(&ws, |w| {
                    w.bb_unfold(
                        &field_handle("field", &field)?,
                        reference,
                        unfold_params(&nyquist, &max_pos, &max_neg, &averaged)?,
                        count("clip gate", &clip)?,
                        missing_or(&bad)?,
                    )
                })
            },
        );
    }

    let ws = shared.clone();
    engine.register_fn(
        "BB_UNFOLDING_LOCAL_WIND",
        move |field: Dynamic,
              nyquist: Dynamic,
              max_pos: Dynamic,
              max_neg: Dynamic,
              averaged: Dynamic,
              ew_wind: Dynamic,
              ns_wind: Dynamic,
              clip: Dynamic,
              bad: Dynamic| {
            call(&ws, |w| {
                let reference = UnfoldReference::LocalWind {
                    ew_wind: real("east-west wind", &ew_wind)?,
                    ns_wind: real("north-south wind", &ns_wind)?,
                };
                w.bb_unfold(
                    &field_handle("field", &field)?,
                    reference,
                    unfold_params(&nyquist, &max_pos, &max_neg, &averaged)?,
                    count("clip gate", &clip)?,
                    missing_or(&bad)?,
                )
            })
        },
    );

    let ws = shared.clone();
    engine.register_fn(
        "FORCE_UNFOLDING",
        move |field: Dynamic, nyquist: Dynamic, center: Dynamic, clip: Dynamic, bad: Dynamic| {
            call(&ws, |w| {
                w.force_unfold(
                    &field_handle("field", &field)?,
                    real("nyquist velocity", &nyquist)?,
                    real("center", &center)?,
                    count("clip gate", &clip)?,
                    missing_or(&bad)?,
                )
            })
        },
    );
}

fn register_gate_edits(engine: &mut Engine, shared: &SharedWorkspace) {
    let ws = shared.clone();
    engine.register_fn(
        "DESPECKLE",
        move |field: Dynamic, length: Dynamic, clip: Dynamic, bad: Dynamic| {
            call(&ws, |w| {
                w.despeckle(
                    &field_handle("field", &field)?,
                    count("speckle length", &length)?,
                    count("clip gate", &clip)?,
                    missing_or(&bad)?,
                )
            })
        },
    );

    let ws = shared.clone();
    engine.register_fn(
        "REMOVE_RING",
        move |field: Dynamic, from_km: Dynamic, to_km: Dynamic, clip: Dynamic, bad: Dynamic| {
            call(&ws, |w| {
                w.remove_ring(
                    &field_handle("field", &field)?,
                    number("ring start", &from_km)?,
                    number("ring end", &to_km)?,
                    count("clip gate", &clip)?,
                    missing_or(&bad)?,
                )
            })
        },
    );

    let ws = shared.clone();
    engine.register_fn("ZERO_INSIDE_BOUNDARY", move |field: Dynamic, clip: Dynamic| {
        call(&ws, |w| {
            w.zero_inside_boundary(&field_handle("field", &field)?, count("clip gate", &clip)?)
        })
    });

    let ws = shared.clone();
    engine.register_fn(
        "UNCONDITIONAL_DELETE",
        move |field: Dynamic, clip: Dynamic, bad: Dynamic| {
            call(&ws, |w| {
                w.unconditional_delete(
                    &field_handle("field", &field)?,
                    count("clip gate", &clip)?,
                    missing_or(&bad)?,
                )
            })
        },
    );
}

fn register_flag_generators(engine: &mut Engine, shared: &SharedWorkspace) {
    for (name, build) in [
        ("SET_BAD_FLAGS_ABOVE", Comparison::Above as fn(f32) -> Comparison),
        ("SET_BAD_FLAGS_BELOW", Comparison::Below),
    ] {
        let ws = shared.clone();
        engine.register_fn(
            name,
            move |field: Dynamic, threshold: Dynamic, clip: Dynamic, bad: Dynamic| {
                call(&ws, |w| {
                    w.set_bad_flags(
                        &field_handle("field", &field)?,
                        build(real("threshold", &threshold)?),
                        count("clip gate", &clip)?,
                        missing_or(&bad)?,
                    )
                })
            },
        );
    }

    let ws = shared.clone();
    engine.register_fn(
        "SET_BAD_FLAGS_BETWEEN",
        move |field: Dynamic, lower: Dynamic, upper: Dynamic, clip: Dynamic, bad: Dynamic| {
            call(&ws, |w| {
                w.set_bad_flags(
                    &field_handle("field", &field)?,
                    Comparison::Between(real("lower threshold", &lower)?, real("upper threshold", &upper)?),
                    count("clip gate", &clip)?,
                    missing_or(&bad)?,
                )
            })
        },
    );

    let ws = shared.clone();
    engine.register_fn("COPY_BAD_FLAGS", move |field: Dynamic, clip: Dynamic, bad: Dynamic| {
        call(&ws, |w| {
            w.copy_bad_flags(
                &field_handle("field", &field)?,
                count("clip gate", &clip)?,
                missing_or(&bad)?,
            )
        })
    });

    let ws = shared.clone();
    engine.register_fn(
        "FLAG_FRECKLES",
        move |field: Dynamic, threshold: Dynamic, avg_count: Dynamic, clip: Dynamic, bad: Dynamic| {
            call(&ws, |w| {
                w.flag_freckles(
                    &field_handle("field", &field)?,
                    real("threshold", &threshold)?,
                    count("average count", &avg_count)?,
                    count("clip gate", &clip)?,
                    missing_or(&bad)?,
                )
            })
        },
    );

    let ws = shared.clone();
    engine.register_fn(
        "FLAG_GLITCHES",
        move |field: Dynamic,
              threshold: Dynamic,
              radius: Dynamic,
              min_gates: Dynamic,
              clip: Dynamic,
              bad: Dynamic| {
            call(&ws, |w| {
                w.flag_glitches(
                    &field_handle("field", &field)?,
                    real("threshold", &threshold)?,
                    count("window radius", &radius)?,
                    count("minimum gates", &min_gates)?,
                    count("clip gate", &clip)?,
                    missing_or(&bad)?,
                )
            })
        },
    );
}

fn register_flag_algebra(engine: &mut Engine, shared: &SharedWorkspace) {
    for (prefix, op) in [("AND", FlagOp::And), ("OR", FlagOp::Or), ("XOR", FlagOp::Xor)] {
        for (suffix, build) in [
            ("ABOVE", Comparison::Above as fn(f32) -> Comparison),
            ("BELOW", Comparison::Below),
        ] {
            let ws = shared.clone();
            engine.register_fn(
                format!("{}_BAD_FLAGS_{}", prefix, suffix),
                move |field: Dynamic, threshold: Dynamic, clip: Dynamic, bad: Dynamic, mask: Dynamic| {
                    call(&ws, |w| {
                        w.combine_bad_flags(
                            &field_handle("field", &field)?,
                            build(real("threshold", &threshold)?),
                            op,
                            count("clip gate", &clip)?,
                            missing_or(&bad)?,
                            &field_handle("bad flag mask", &mask)?,
                        )
                    })
                },
            );
        }

        let ws = shared.clone();
        engine.register_fn(
            format!("{}_BAD_FLAGS_BETWEEN", prefix),
            move |field: Dynamic,
                  lower: Dynamic,
                  upper: Dynamic,
                  clip: Dynamic,
                  bad: Dynamic,
                  mask: Dynamic| {
                call(&ws, |w| {
                    w.combine_bad_flags(
                        &field_handle("field", &field)?,
                        Comparison::Between(
                            real("lower threshold", &lower)?,
                            real("upper threshold", &upper)?,
                        ),
                        op,
                        count("clip gate", &clip)?,
                        missing_or(&bad)?,
                        &field_handle("bad flag mask", &mask)?,
                    )
                })
            },
        );
    }

    let ws = shared.clone();
    engine.register_fn(
        "ASSERT_BAD_FLAGS",
        move |field: Dynamic, clip: Dynamic, bad: Dynamic, mask: Dynamic| {
            call(&ws, |w| {
                w.assert_bad_flags(
                    &field_handle("field", &field)?,
                    count("clip gate", &clip)?,
                    missing_or(&bad)?,
                    &field_handle("bad flag mask", &mask)?,
                )
            })
        },
    );

    let ws = shared.clone();
    engine.register_fn("CLEAR_BAD_FLAGS", move |mask: Dynamic| {
        call(&ws, |w| w.clear_bad_flags(&field_handle("bad flag mask", &mask)?))
    });

    let ws = shared.clone();
    engine.register_fn("COMPLEMENT_BAD_FLAGS", move |mask: Dynamic| {
        call(&ws, |w| w.complement_bad_flags(&field_handle("bad flag mask", &mask)?))
    });
}

fn register_flagged(engine: &mut Engine, shared: &SharedWorkspace) {
    let ws = shared.clone();
    engine.register_fn(
        "FLAGGED_ADD",
        move |field: Dynamic, constant: Dynamic, clip: Dynamic, bad: Dynamic, mask: Dynamic| {
            call(&ws, |w| {
                w.flagged_add(
                    &field_handle("field", &field)?,
                    real("constant", &constant)?,
                    count("clip gate", &clip)?,
                    missing_or(&bad)?,
                    &field_handle("bad flag mask", &mask)?,
                )
            })
        },
    );

    let ws = shared.clone();
    engine.register_fn(
        "FLAGGED_MULTIPLY",
        move |field: Dynamic, constant: Dynamic, clip: Dynamic, bad: Dynamic, mask: Dynamic| {
            call(&ws, |w| {
                w.flagged_multiply(
                    &field_handle("field", &field)?,
                    real("constant", &constant)?,
                    count("clip gate", &clip)?,
                    missing_or(&bad)?,
                    &field_handle("bad flag mask", &mask)?,
                )
            })
        },
    );

    let ws = shared.clone();
    engine.register_fn(
        "FLAGGED_ASSIGN",
        move |field: Dynamic, constant: Dynamic, clip: Dynamic, mask: Dynamic| {
            call(&ws, |w| {
                w.flagged_assign(
                    &field_handle("field", &field)?,
                    real("constant", &constant)?,
                    count("clip gate", &clip)?,
                    &field_handle("bad flag mask", &mask)?,
                )
            })
        },
    );

    let ws = shared.clone();
    engine.register_fn(
        "FLAGGED_COPY",
        move |source: Dynamic, target: Dynamic, clip: Dynamic, mask: Dynamic| {
            call(&ws, |w| {
                w.flagged_copy(
                    &field_handle("source field", &source)?,
                    &field_handle("target field", &target)?,
                    count("clip gate", &clip)?,
                    &field_handle("bad flag mask", &mask)?,
                )
            })
        },
    );
}

fn register_thresholds(engine: &mut Engine, shared: &SharedWorkspace) {
    for (name, build) in [
        ("THRESHOLD_ABOVE", Comparison::Above as fn(f32) -> Comparison),
        ("THRESHOLD_BELOW", Comparison::Below),
    ] {
        let ws = shared.clone();
        engine.register_fn(
            name,
            move |field: Dynamic,
                  threshold_field: Dynamic,
                  threshold: Dynamic,
                  first_good_gate: Dynamic,
                  clip: Dynamic,
                  bad: Dynamic| {
                call(&ws, |w| {
                    w.threshold(
                        &field_handle("field", &field)?,
                        &field_handle("threshold field", &threshold_field)?,
                        build(real("threshold", &threshold)?),
                        count("first good gate", &first_good_gate)?,
                        count("clip gate", &clip)?,
                        missing_or(&bad)?,
                    )
                })
            },
        );
    }

    let ws = shared.clone();
    engine.register_fn(
        "THRESHOLD_BETWEEN",
        move |field: Dynamic,
              threshold_field: Dynamic,
              lower: Dynamic,
              upper: Dynamic,
              first_good_gate: Dynamic,
              clip: Dynamic,
              bad: Dynamic| {
            call(&ws, |w| {
                w.threshold(
                    &field_handle("field", &field)?,
                    &field_handle("threshold field", &threshold_field)?,
                    Comparison::Between(
                        real("lower threshold", &lower)?,
                        real("upper threshold", &upper)?,
                    ),
                    count("first good gate", &first_good_gate)?,
                    count("clip gate", &clip)?,
                    missing_or(&bad)?,
                )
            })
        },
    );
}
